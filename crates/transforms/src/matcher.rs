//! Locates call sites in a method body.
//!
//! Matching is exact on owner, name, descriptor and dispatch kind, so an overload or a call
//! dispatched differently never qualifies. A miss is an expected outcome when the target method
//! has drifted between versions and is returned as `None`.

use graft_core::frame::LocalContext;
use graft_core::{DispatchKind, InsnId, Instruction, MethodBody, MethodRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Call-site query: which call to look for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSiteDescriptor {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub kind: DispatchKind,
}

impl CallSiteDescriptor {
    pub fn new(
        kind: DispatchKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            kind,
        }
    }

    /// Exact match on all four fields.
    pub fn matches(&self, call: &MethodRef) -> bool {
        self.kind == call.kind
            && self.owner == call.owner
            && self.name == call.name
            && self.descriptor == call.descriptor
    }

    fn matches_insn(&self, insn: &Instruction) -> bool {
        insn.method_ref().is_some_and(|call| self.matches(call))
    }
}

impl fmt::Display for CallSiteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{} {}",
            self.kind, self.owner, self.name, self.descriptor
        )
    }
}

/// A located call together with the state right before it executes.
#[derive(Clone, Debug, PartialEq)]
pub struct CallMatch {
    pub id: InsnId,
    pub position: usize,
    pub context: LocalContext,
}

impl CallMatch {
    fn new(method: &MethodBody, id: InsnId, position: usize) -> Self {
        Self {
            id,
            position,
            context: LocalContext::at(method, position),
        }
    }
}

/// Returns the first call in the method matching `descriptor`.
pub fn find_first_call(method: &MethodBody, descriptor: &CallSiteDescriptor) -> Option<CallMatch> {
    let found = method
        .instructions
        .iter()
        .enumerate()
        .find(|(_, (_, insn))| descriptor.matches_insn(insn));

    match found {
        Some((position, (id, _))) => {
            debug!("Found {} at position {}", descriptor, position);
            Some(CallMatch::new(method, id, position))
        }
        None => {
            debug!("No call to {} in {}.{}", descriptor, method.owner, method.name);
            None
        }
    }
}

/// Returns the call matching `descriptor` closest before `bound`, scanning `[0, bound)`.
///
/// The nearest preceding occurrence wins over earlier ones. A bound past the end of the
/// sequence covers the whole sequence.
pub fn find_first_call_before(
    method: &MethodBody,
    descriptor: &CallSiteDescriptor,
    bound: usize,
) -> Option<CallMatch> {
    let found = method
        .instructions
        .range(0..bound)
        .rev()
        .find(|(_, _, insn)| descriptor.matches_insn(insn));

    match found {
        Some((position, id, _)) => {
            debug!(
                "Found {} at position {} (bound {})",
                descriptor, position, bound
            );
            Some(CallMatch::new(method, id, position))
        }
        None => {
            debug!("No call to {} before position {}", descriptor, bound);
            None
        }
    }
}
