//! Hook splicing.
//!
//! Builds the three-record fragment that hands the value produced at an anchor to a static hook
//! together with the owning entity, and places it at the anchor. The hook's return value takes
//! the place of the original value for everything that follows.
//!
//! Assembly example (policy `after`):
//! ```text
//! // Original
//! INVOKEVIRTUAL Player.getItemStackFromSlot (LSlot;)LItemStack;
//! ASTORE 2
//!
//! // After splicing
//! INVOKEVIRTUAL Player.getItemStackFromSlot (LSlot;)LItemStack;
//! ALOAD 0                              // this
//! GETFIELD Handler.player : LPlayer;   // owning entity
//! INVOKESTATIC Hooks.transformItem (LItemStack;LLivingEntity;)LItemStack;
//! ASTORE 2                             // now stores the hook's result
//! ```

use crate::{Error, Result};
use graft_core::descriptor::{FieldType, MethodDescriptor};
use graft_core::frame::LocalContext;
use graft_core::{
    DispatchKind, FieldRef, InsnId, Instruction, InstructionSequence, MethodBody, MethodRef,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Where the fragment goes relative to the anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionPolicy {
    /// Right after the anchor; the hook sees the value the anchor produced.
    #[default]
    After,
    /// Right before the anchor; the hook sees the value on top of the stack at the anchor.
    Before,
}

/// The static hook to call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDescriptor {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl HookDescriptor {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Checks the `(item, entity) -> item` shape and returns the item type.
    pub fn item_type(&self) -> Result<FieldType> {
        let invalid = |reason: String| Error::InvalidHook {
            hook: self.to_string(),
            reason,
        };
        let desc = MethodDescriptor::parse(&self.descriptor).map_err(|e| invalid(e.to_string()))?;
        let [item, entity] = desc.params.as_slice() else {
            return Err(invalid(format!(
                "expected 2 parameters, found {}",
                desc.params.len()
            )));
        };
        if !item.is_reference() || !entity.is_reference() {
            return Err(invalid("parameters must be reference types".into()));
        }
        if desc.ret.as_ref() != Some(item) {
            return Err(invalid(format!("must return its first parameter type {item}")));
        }
        Ok(item.clone())
    }

    fn call(&self) -> MethodRef {
        MethodRef::new(
            DispatchKind::Static,
            self.owner.clone(),
            self.name.clone(),
            self.descriptor.clone(),
        )
    }
}

impl fmt::Display for HookDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.owner, self.name, self.descriptor)
    }
}

/// Newly built records, kept in build order: hook call, field read, `this` load.
#[derive(Clone, Debug, PartialEq)]
pub struct SpliceFragment {
    records: Vec<Instruction>,
}

impl SpliceFragment {
    pub fn build(hook: &HookDescriptor, receiver_field: &FieldRef) -> Result<Self> {
        hook.item_type()?;
        let field_type = FieldType::parse(&receiver_field.descriptor).map_err(|e| {
            Error::InvalidReceiverField {
                field: receiver_field.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !field_type.is_reference() {
            return Err(Error::InvalidReceiverField {
                field: receiver_field.to_string(),
                reason: "not a reference type".into(),
            });
        }

        Ok(Self {
            records: vec![
                Instruction::invoke(hook.call()),
                Instruction::get_field(receiver_field.clone()),
                Instruction::aload(0),
            ],
        })
    }

    /// Records in build order.
    pub fn records(&self) -> &[Instruction] {
        &self.records
    }

    /// Records in the order they execute once spliced.
    pub fn runtime_order(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.records.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Checks that the fragment is well-formed at the anchor; `Err` carries the reason.
///
/// A stack the simulation could not follow is accepted with a warning.
pub fn check_preconditions(
    method: &MethodBody,
    anchor: &Instruction,
    context: &LocalContext,
    hook: &HookDescriptor,
    policy: InsertionPolicy,
) -> std::result::Result<(), String> {
    if method.is_static || !context.is_assigned(0) {
        return Err("slot 0 does not hold a receiver".into());
    }
    if context.is_clobbered(0) {
        return Err("slot 0 is overwritten before the anchor".into());
    }

    let item = hook.item_type().map_err(|e| e.to_string())?;
    let required = match policy {
        InsertionPolicy::After => {
            let call = anchor
                .method_ref()
                .ok_or_else(|| format!("anchor {anchor} is not a call"))?;
            let desc = MethodDescriptor::parse(&call.descriptor).map_err(|e| e.to_string())?;
            match &desc.ret {
                Some(ret) if *ret == item => {}
                Some(ret) => {
                    return Err(format!("anchor returns {ret}, hook expects {item}"));
                }
                None => return Err("anchor call returns void".into()),
            }
            desc.params.len() + usize::from(call.kind.has_receiver())
        }
        InsertionPolicy::Before => 1,
    };

    match context.stack_depth() {
        Some(depth) if depth < required => Err(format!(
            "stack holds {depth} value(s), anchor needs {required}"
        )),
        Some(_) => Ok(()),
        None => {
            warn!(
                "Operand stack unknown at position {}, splicing without a depth check",
                context.position
            );
            Ok(())
        }
    }
}

/// Places the fragment at `anchor`, one record at a time in build order.
///
/// Each record goes directly next to the anchor (`After`) or directly before the previously
/// inserted record (`Before`), so the last record built runs first. Returns the new ids in
/// runtime order. Fails without touching the sequence if the anchor is not a member.
pub fn splice(
    sequence: &mut InstructionSequence,
    anchor: InsnId,
    fragment: SpliceFragment,
    policy: InsertionPolicy,
) -> graft_core::result::Result<Vec<InsnId>> {
    sequence.index_of(anchor)?;

    let mut inserted = Vec::with_capacity(fragment.len());
    let mut cursor = anchor;
    for record in fragment.records {
        debug!("Splicing {} ({:?} {})", record, policy, cursor);
        let ids = match policy {
            InsertionPolicy::After => sequence.insert_after(anchor, [record])?,
            InsertionPolicy::Before => sequence.insert_before(cursor, [record])?,
        };
        cursor = ids.last().copied().unwrap_or(cursor);
        inserted.extend(ids);
    }

    inserted.reverse();
    Ok(inserted)
}
