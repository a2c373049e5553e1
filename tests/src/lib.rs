//! Shared fixtures for the integration tests.

use graft_core::listing::{parse_listing, read_listing};
use graft_core::{
    DispatchKind, FieldRef, Instruction, InstructionSequence, MethodBody, MethodRef, Opcode,
};
use std::path::PathBuf;

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Parses a listing fixture.
pub fn load_fixture(name: &str) -> MethodBody {
    read_listing(fixture_path(name)).unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

/// `ServerPlayNetHandler.processEntityAction` with both the sneak and glide branches.
pub fn entity_action() -> MethodBody {
    load_fixture("process_entity_action.asm")
}

/// The same method after the glide check stopped calling `ElytraItem.isUsable`.
pub fn entity_action_drifted() -> MethodBody {
    load_fixture("process_entity_action_drifted.asm")
}

/// Abstract records used to generate method bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Call producing an item from a slot.
    GetItem,
    /// Same owner and name as `GetItem`, different descriptor.
    GetItemOverload,
    /// Check consuming an item.
    IsUsable,
    /// Filler that does not touch the stack.
    Nop,
}

pub const OWNER: &str = "a/Handler";
pub const PLAYER: &str = "a/Player";
pub const GET_ITEM_DESC: &str = "(La/Slot;)La/Stack;";
pub const IS_USABLE_DESC: &str = "(La/Stack;)Z";

/// Builds a stack-balanced instance method `a/Handler.handle (La/Slot;)V` from abstract steps.
pub fn method_from_steps(steps: &[Step]) -> MethodBody {
    let mut sequence = InstructionSequence::new();
    let player = FieldRef::new(OWNER, "player", "La/Player;");
    for step in steps {
        match step {
            Step::GetItem | Step::GetItemOverload => {
                let overload = *step == Step::GetItemOverload;
                sequence.push(Instruction::aload(0));
                sequence.push(Instruction::get_field(player.clone()));
                sequence.push(Instruction::aload(1));
                if overload {
                    push_simple(&mut sequence, Opcode::ICONST_0);
                }
                sequence.push(Instruction::invoke(MethodRef::new(
                    DispatchKind::Virtual,
                    PLAYER,
                    "getItem",
                    if overload {
                        "(La/Slot;I)La/Stack;"
                    } else {
                        GET_ITEM_DESC
                    },
                )));
                push_simple(&mut sequence, Opcode::POP);
            }
            Step::IsUsable => {
                push_simple(&mut sequence, Opcode::ACONST_NULL);
                sequence.push(Instruction::invoke(MethodRef::new(
                    DispatchKind::Static,
                    "a/Elytra",
                    "isUsable",
                    IS_USABLE_DESC,
                )));
                push_simple(&mut sequence, Opcode::POP);
            }
            Step::Nop => push_simple(&mut sequence, Opcode::NOP),
        }
    }
    push_simple(&mut sequence, Opcode::RETURN);

    let header = format!(".method {OWNER} handle (La/Slot;)V");
    parse_listing(&header)
        .unwrap_or_else(|e| panic!("header: {e}"))
        .with_instructions(sequence)
}

fn push_simple(sequence: &mut InstructionSequence, op: Opcode) {
    let insn = Instruction::simple(op).unwrap_or_else(|e| panic!("{op}: {e}"));
    sequence.push(insn);
}
