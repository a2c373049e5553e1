//! Hook patch engine.
//!
//! One patch request walks a fixed path:
//!
//! ```text
//! SearchingAnchor -> SearchingPreceding -> Splicing -> Done
//!        \                  \                 \
//!         +------------------+-----------------+--> Aborted
//! ```
//!
//! The anchor is the first call matching the anchor query. The preceding anchor is the nearest
//! call matching its own query strictly before the anchor; that is where the hook fragment is
//! spliced. Any miss aborts before the method body is touched, leaving it exactly as it was.

use crate::matcher::{CallSiteDescriptor, find_first_call, find_first_call_before};
use crate::resolver::NameResolver;
use crate::splice::{HookDescriptor, InsertionPolicy, SpliceFragment, check_preconditions, splice};
use crate::{Result, Transform};
use graft_core::frame::LocalContext;
use graft_core::{FieldRef, InsnId, MethodBody};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Method a patch is written for. The host decides where a patch runs; this is only compared
/// against the body actually handed over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchTarget {
    pub class: String,
    pub method: String,
    pub descriptor: String,
}

/// A call-site query plus the human readable name used in diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSpec {
    pub label: String,
    #[serde(flatten)]
    pub call: CallSiteDescriptor,
}

/// Logical description of a hook patch, before name resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchConfig {
    pub name: String,
    pub target: PatchTarget,
    /// First call of this shape marks the region of interest.
    pub anchor: AnchorSpec,
    /// Nearest call of this shape before the anchor receives the hook.
    pub preceding: AnchorSpec,
    pub hook: HookDescriptor,
    /// Field on `this` that holds the owning entity.
    pub receiver_field: FieldRef,
    #[serde(default)]
    pub policy: InsertionPolicy,
}

impl PatchConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolves member names and validates the hook, producing a ready-to-run patch.
    pub fn resolve(&self, resolver: &dyn NameResolver) -> Result<HookPatch> {
        let fragment = SpliceFragment::build(&self.hook, &self.receiver_field)?;
        let receiver_field = resolver.resolve_field(&self.receiver_field);
        debug!(
            "Resolved '{}': {} fragment records, receiver field {}",
            self.name,
            fragment.len(),
            receiver_field
        );

        Ok(HookPatch {
            name: self.name.clone(),
            target: PatchTarget {
                method: resolver.method_name(&self.target.method),
                ..self.target.clone()
            },
            anchor: AnchorSpec {
                label: self.anchor.label.clone(),
                call: resolver.resolve_method(&self.anchor.call),
            },
            preceding: AnchorSpec {
                label: self.preceding.label.clone(),
                call: resolver.resolve_method(&self.preceding.call),
            },
            hook: self.hook.clone(),
            receiver_field,
            policy: self.policy,
        })
    }
}

/// Which of the two searches failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRole {
    Anchor,
    Preceding,
}

impl fmt::Display for AnchorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorRole::Anchor => f.write_str("anchor"),
            AnchorRole::Preceding => f.write_str("preceding anchor"),
        }
    }
}

/// Progress of one patch request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchState {
    SearchingAnchor,
    SearchingPreceding,
    Splicing,
    Done,
    Aborted,
}

#[derive(Debug, Error)]
pub enum PatchError {
    /// A required call is absent; expected when the target method has changed shape.
    #[error("{role} '{label}' ({descriptor}) not found")]
    AnchorNotFound {
        role: AnchorRole,
        label: String,
        descriptor: CallSiteDescriptor,
    },

    /// The fragment would not be well-formed at the anchor.
    #[error("unsafe splice at position {position}: {reason}")]
    UnsafeSplice { position: usize, reason: String },

    /// Integration error, e.g. an anchor that is not part of the sequence.
    #[error(transparent)]
    Core(#[from] graft_core::result::Error),
}

impl PatchError {
    /// Non-fatal errors leave the method untouched and only disable the patch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PatchError::Core(_))
    }
}

/// What a successful splice did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpliceReport {
    /// Position of the anchor before splicing.
    pub anchor_position: usize,
    /// Position of the preceding anchor before splicing.
    pub preceding_position: usize,
    /// Ids of the inserted records, in runtime order.
    pub inserted: Vec<InsnId>,
    /// State at the preceding anchor before splicing.
    pub context: LocalContext,
}

/// Result of running a patch, successful or not.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatchOutcome {
    pub patch: String,
    pub state: PatchState,
    /// Stage that failed, for aborted runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<PatchState>,
    pub applied: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SpliceReport>,
}

/// A resolved hook patch, ready to apply to method bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookPatch {
    pub name: String,
    pub target: PatchTarget,
    pub anchor: AnchorSpec,
    pub preceding: AnchorSpec,
    pub hook: HookDescriptor,
    pub receiver_field: FieldRef,
    pub policy: InsertionPolicy,
}

impl HookPatch {
    /// Returns true if `method` is the method this patch was written for.
    pub fn targets(&self, method: &MethodBody) -> bool {
        method.owner == self.target.class
            && method.name == self.target.method
            && method.descriptor() == self.target.descriptor
    }

    /// Applies the patch. On any error other than [`PatchError::Core`] the body is unchanged.
    pub fn apply(&self, method: &mut MethodBody) -> std::result::Result<SpliceReport, PatchError> {
        let mut state = PatchState::SearchingAnchor;
        self.drive(method, &mut state)
    }

    /// Applies the patch and reports the outcome, logging each step.
    ///
    /// Missing anchors and unsafe splices are reported in the outcome; only fatal errors are
    /// returned as `Err`.
    pub fn run(&self, method: &mut MethodBody) -> Result<PatchOutcome> {
        info!("Adding '{}' patch...", self.name);
        if !self.targets(method) {
            warn!(
                "'{}' targets {}.{} {}, applying to {}.{} {}",
                self.name,
                self.target.class,
                self.target.method,
                self.target.descriptor,
                method.owner,
                method.name,
                method.descriptor()
            );
        }

        let mut state = PatchState::SearchingAnchor;
        let result = self.drive(method, &mut state);
        self.conclude(result, state)
    }

    /// Turns the result of one attempt into an outcome; fatal errors become `Err`.
    fn conclude(
        &self,
        result: std::result::Result<SpliceReport, PatchError>,
        state: PatchState,
    ) -> Result<PatchOutcome> {
        match result {
            Ok(report) => {
                let message = format!("Added '{}' patch!", self.name);
                info!("{}", message);
                Ok(PatchOutcome {
                    patch: self.name.clone(),
                    state: PatchState::Done,
                    failed_at: None,
                    applied: true,
                    message,
                    report: Some(report),
                })
            }
            Err(PatchError::Core(err)) => Err(err.into()),
            Err(err) => {
                let message = self.failure_message(&err);
                info!("{}", message);
                Ok(PatchOutcome {
                    patch: self.name.clone(),
                    state: PatchState::Aborted,
                    failed_at: Some(state),
                    applied: false,
                    message,
                    report: None,
                })
            }
        }
    }

    fn failure_message(&self, err: &PatchError) -> String {
        let reason = match err {
            PatchError::AnchorNotFound {
                role: AnchorRole::Anchor,
                label,
                ..
            } => format!("Resolving {label} failed!"),
            PatchError::AnchorNotFound {
                role: AnchorRole::Preceding,
                label,
                ..
            } => format!("Resolving previous {label} failed!"),
            other => other.to_string(),
        };
        format!("Failed applying '{}' patch. {}", self.name, reason)
    }

    fn drive(
        &self,
        method: &mut MethodBody,
        state: &mut PatchState,
    ) -> std::result::Result<SpliceReport, PatchError> {
        *state = PatchState::SearchingAnchor;
        let Some(anchor) = find_first_call(method, &self.anchor.call) else {
            return Err(PatchError::AnchorNotFound {
                role: AnchorRole::Anchor,
                label: self.anchor.label.clone(),
                descriptor: self.anchor.call.clone(),
            });
        };

        *state = PatchState::SearchingPreceding;
        let bound = method.instructions.index_of(anchor.id)?;
        let Some(preceding) = find_first_call_before(method, &self.preceding.call, bound) else {
            return Err(PatchError::AnchorNotFound {
                role: AnchorRole::Preceding,
                label: self.preceding.label.clone(),
                descriptor: self.preceding.call.clone(),
            });
        };

        *state = PatchState::Splicing;
        let anchor_insn = method
            .instructions
            .get(preceding.id)
            .ok_or(graft_core::result::Error::RecordNotMember(preceding.id))?;
        check_preconditions(
            method,
            anchor_insn,
            &preceding.context,
            &self.hook,
            self.policy,
        )
        .map_err(|reason| PatchError::UnsafeSplice {
            position: preceding.position,
            reason,
        })?;

        let fragment = SpliceFragment::build(&self.hook, &self.receiver_field).map_err(|e| {
            PatchError::UnsafeSplice {
                position: preceding.position,
                reason: e.to_string(),
            }
        })?;
        let inserted = splice(&mut method.instructions, preceding.id, fragment, self.policy)?;

        *state = PatchState::Done;
        debug!(
            "'{}' spliced {} record(s) at position {} ({:?})",
            self.name,
            inserted.len(),
            preceding.position,
            self.policy
        );
        Ok(SpliceReport {
            anchor_position: anchor.position,
            preceding_position: preceding.position,
            inserted,
            context: preceding.context,
        })
    }
}

impl Transform for HookPatch {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, method: &mut MethodBody) -> Result<bool> {
        Ok(self.run(method)?.applied)
    }
}
