//! Opcode set understood by the instruction model.

use crate::result::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares the opcode enum together with its mnemonic table.
macro_rules! def_opcodes {
    ($($name:ident),* $(,)?) => {
        /// A JVM-style opcode. `LABEL` is a pseudo-instruction marking a branch target.
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Opcode {
            $($name),*
        }

        impl Opcode {
            /// Every opcode, in declaration order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];

            /// The upper-case mnemonic used in listings.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name)),*
                }
            }
        }

        impl FromStr for Opcode {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(Opcode::$name),)*
                    other => Err(Error::UnknownOpcode(other.to_string())),
                }
            }
        }
    };
}

def_opcodes! {
    NOP,
    ACONST_NULL,
    ICONST_M1, ICONST_0, ICONST_1, ICONST_2, ICONST_3, ICONST_4, ICONST_5,
    LCONST_0, LCONST_1,
    FCONST_0, FCONST_1, FCONST_2,
    DCONST_0, DCONST_1,
    BIPUSH, SIPUSH, LDC,
    ILOAD, LLOAD, FLOAD, DLOAD, ALOAD,
    ISTORE, LSTORE, FSTORE, DSTORE, ASTORE,
    IINC,
    POP, POP2, DUP, DUP_X1, DUP_X2, DUP2, SWAP,
    IADD, ISUB, IMUL, IDIV, IREM, INEG, IAND, IOR, IXOR,
    IFEQ, IFNE, IFLT, IFGE, IFGT, IFLE,
    IF_ICMPEQ, IF_ICMPNE, IF_ICMPLT, IF_ICMPGE, IF_ICMPGT, IF_ICMPLE,
    IF_ACMPEQ, IF_ACMPNE, IFNULL, IFNONNULL,
    GOTO,
    IRETURN, LRETURN, FRETURN, DRETURN, ARETURN, RETURN, ATHROW,
    GETSTATIC, PUTSTATIC, GETFIELD, PUTFIELD,
    INVOKEVIRTUAL, INVOKESPECIAL, INVOKESTATIC, INVOKEINTERFACE,
    NEW, CHECKCAST, INSTANCEOF, ANEWARRAY, ARRAYLENGTH,
    MONITORENTER, MONITOREXIT,
    LABEL,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

/// Operand shape an opcode expects, used to validate payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Int,
    Constant,
    Var,
    Iinc,
    Jump,
    Field,
    Method,
    Type,
    Label,
}

impl Opcode {
    /// Returns the operand shape this opcode carries.
    pub fn operand_kind(self) -> OperandKind {
        use Opcode::*;
        match self {
            BIPUSH | SIPUSH => OperandKind::Int,
            LDC => OperandKind::Constant,
            ILOAD | LLOAD | FLOAD | DLOAD | ALOAD | ISTORE | LSTORE | FSTORE | DSTORE
            | ASTORE => OperandKind::Var,
            IINC => OperandKind::Iinc,
            IFEQ | IFNE | IFLT | IFGE | IFGT | IFLE | IF_ICMPEQ | IF_ICMPNE | IF_ICMPLT
            | IF_ICMPGE | IF_ICMPGT | IF_ICMPLE | IF_ACMPEQ | IF_ACMPNE | IFNULL | IFNONNULL
            | GOTO => OperandKind::Jump,
            GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD => OperandKind::Field,
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC | INVOKEINTERFACE => OperandKind::Method,
            NEW | CHECKCAST | INSTANCEOF | ANEWARRAY => OperandKind::Type,
            LABEL => OperandKind::Label,
            _ => OperandKind::None,
        }
    }

    /// Returns true for the four invoke opcodes.
    #[inline]
    pub fn is_invoke(self) -> bool {
        self.operand_kind() == OperandKind::Method
    }

    /// Returns true for conditional and unconditional branches.
    #[inline]
    pub fn is_jump(self) -> bool {
        self.operand_kind() == OperandKind::Jump
    }
}
