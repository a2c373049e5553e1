//! Instruction records and their operand payloads.

use crate::opcode::{Opcode, OperandKind};
use crate::result::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a record inside one [`InstructionSequence`](crate::sequence::InstructionSequence).
///
/// Ids are never reused and carry the tag of the sequence that issued them, so an id taken from
/// one sequence is never a member of another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InsnId {
    pub(crate) sequence: u32,
    pub(crate) index: u32,
}

impl fmt::Display for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.sequence, self.index)
    }
}

/// How a call is dispatched; one-to-one with the invoke opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchKind {
    Static,
    Virtual,
    Special,
    Interface,
}

impl DispatchKind {
    pub fn opcode(self) -> Opcode {
        match self {
            DispatchKind::Static => Opcode::INVOKESTATIC,
            DispatchKind::Virtual => Opcode::INVOKEVIRTUAL,
            DispatchKind::Special => Opcode::INVOKESPECIAL,
            DispatchKind::Interface => Opcode::INVOKEINTERFACE,
        }
    }

    pub fn from_opcode(op: Opcode) -> Option<Self> {
        match op {
            Opcode::INVOKESTATIC => Some(DispatchKind::Static),
            Opcode::INVOKEVIRTUAL => Some(DispatchKind::Virtual),
            Opcode::INVOKESPECIAL => Some(DispatchKind::Special),
            Opcode::INVOKEINTERFACE => Some(DispatchKind::Interface),
            _ => None,
        }
    }

    /// Static calls have no receiver on the operand stack.
    #[inline]
    pub fn has_receiver(self) -> bool {
        self != DispatchKind::Static
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchKind::Static => "static",
            DispatchKind::Virtual => "virtual",
            DispatchKind::Special => "special",
            DispatchKind::Interface => "interface",
        };
        f.write_str(name)
    }
}

/// Field reference: owner internal name, field name and type descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl FieldRef {
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
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} : {}", self.owner, self.name, self.descriptor)
    }
}

/// Method reference including how the call is dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub kind: DispatchKind,
}

impl MethodRef {
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
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.owner, self.name, self.descriptor)
    }
}

/// Constant pushed by `LDC`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Class literal, stored as a field descriptor (`Lpkg/Type;`).
    Type(String),
}

impl Constant {
    /// Stack width of the pushed value.
    pub fn size(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Long(v) => write!(f, "{v}L"),
            Constant::Float(v) => write!(f, "{v:?}F"),
            Constant::Double(v) => write!(f, "{v:?}D"),
            Constant::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("\"")
            }
            Constant::Type(desc) => f.write_str(desc),
        }
    }
}

/// Kind-specific operand of an instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    None,
    Int(i32),
    Constant(Constant),
    Var(u16),
    Iinc { slot: u16, delta: i16 },
    Jump(String),
    Field(FieldRef),
    Method(MethodRef),
    Type(String),
    Label(String),
}

impl Payload {
    fn kind(&self) -> OperandKind {
        match self {
            Payload::None => OperandKind::None,
            Payload::Int(_) => OperandKind::Int,
            Payload::Constant(_) => OperandKind::Constant,
            Payload::Var(_) => OperandKind::Var,
            Payload::Iinc { .. } => OperandKind::Iinc,
            Payload::Jump(_) => OperandKind::Jump,
            Payload::Field(_) => OperandKind::Field,
            Payload::Method(_) => OperandKind::Method,
            Payload::Type(_) => OperandKind::Type,
            Payload::Label(_) => OperandKind::Label,
        }
    }
}

/// One unit of code in a method body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Instruction {
    op: Opcode,
    payload: Payload,
}

impl Instruction {
    /// Creates an instruction, checking that the payload fits the opcode.
    pub fn new(op: Opcode, payload: Payload) -> Result<Self> {
        if op.operand_kind() != payload.kind() {
            return Err(Error::PayloadMismatch(op.to_string()));
        }
        if let Payload::Method(method) = &payload
            && method.kind.opcode() != op
        {
            return Err(Error::PayloadMismatch(format!(
                "{op} with {} dispatch",
                method.kind
            )));
        }
        Ok(Self { op, payload })
    }

    /// An operand-less instruction such as `DUP` or `RETURN`.
    pub fn simple(op: Opcode) -> Result<Self> {
        Self::new(op, Payload::None)
    }

    pub fn var(op: Opcode, slot: u16) -> Result<Self> {
        Self::new(op, Payload::Var(slot))
    }

    /// `ALOAD slot`.
    pub fn aload(slot: u16) -> Self {
        Self {
            op: Opcode::ALOAD,
            payload: Payload::Var(slot),
        }
    }

    pub fn field(op: Opcode, field: FieldRef) -> Result<Self> {
        Self::new(op, Payload::Field(field))
    }

    /// `GETFIELD owner.name : descriptor`.
    pub fn get_field(field: FieldRef) -> Self {
        Self {
            op: Opcode::GETFIELD,
            payload: Payload::Field(field),
        }
    }

    /// A call; the opcode follows the dispatch kind of the reference.
    pub fn invoke(method: MethodRef) -> Self {
        Self {
            op: method.kind.opcode(),
            payload: Payload::Method(method),
        }
    }

    pub fn jump(op: Opcode, label: impl Into<String>) -> Result<Self> {
        Self::new(op, Payload::Jump(label.into()))
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self {
            op: Opcode::LABEL,
            payload: Payload::Label(name.into()),
        }
    }

    #[inline]
    pub fn op(&self) -> Opcode {
        self.op
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn method_ref(&self) -> Option<&MethodRef> {
        match &self.payload {
            Payload::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn field_ref(&self) -> Option<&FieldRef> {
        match &self.payload {
            Payload::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn var_slot(&self) -> Option<u16> {
        match self.payload {
            Payload::Var(slot) | Payload::Iinc { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// Name of the label this instruction defines, if it is a `LABEL`.
    pub fn label_name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Label(name) => Some(name),
            _ => None,
        }
    }

    /// Branch target of a jump instruction.
    pub fn jump_target(&self) -> Option<&str> {
        match &self.payload {
            Payload::Jump(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Label(name) => write!(f, "{name}:"),
            Payload::None => write!(f, "{}", self.op),
            Payload::Int(v) => write!(f, "{} {v}", self.op),
            Payload::Constant(c) => write!(f, "{} {c}", self.op),
            Payload::Var(slot) => write!(f, "{} {slot}", self.op),
            Payload::Iinc { slot, delta } => write!(f, "{} {slot} {delta}", self.op),
            Payload::Jump(label) => write!(f, "{} {label}", self.op),
            Payload::Field(field) => write!(f, "{} {field}", self.op),
            Payload::Method(method) => write!(f, "{} {method}", self.op),
            Payload::Type(name) => write!(f, "{} {name}", self.op),
        }
    }
}
