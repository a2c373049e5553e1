pub mod descriptor;
pub mod frame;
pub mod instruction;
pub mod listing;
pub mod method;
pub mod opcode;
pub mod result;
pub mod sequence;

pub use instruction::{DispatchKind, FieldRef, InsnId, Instruction, MethodRef, Payload};
pub use method::MethodBody;
pub use opcode::Opcode;
pub use sequence::InstructionSequence;

/// Returns true if the opcode ends execution of the method.
#[inline]
pub fn is_terminal_opcode(opcode: Opcode) -> bool {
    matches!(
        opcode,
        Opcode::IRETURN
            | Opcode::LRETURN
            | Opcode::FRETURN
            | Opcode::DRETURN
            | Opcode::ARETURN
            | Opcode::RETURN
            | Opcode::ATHROW
    )
}
