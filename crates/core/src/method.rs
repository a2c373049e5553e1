use crate::descriptor::MethodDescriptor;
use crate::result::Result;
use crate::sequence::InstructionSequence;
use std::collections::BTreeSet;

/// A method body handed over by the host: its signature plus its instruction stream.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodBody {
    /// Internal name of the declaring class, e.g. `net/minecraft/network/play/ServerPlayNetHandler`.
    pub owner: String,
    pub name: String,
    descriptor: String,
    pub is_static: bool,
    pub instructions: InstructionSequence,
    signature: MethodDescriptor,
}

impl MethodBody {
    /// Creates an empty body; fails if the descriptor does not parse.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        is_static: bool,
    ) -> Result<Self> {
        let descriptor = descriptor.into();
        let signature = MethodDescriptor::parse(&descriptor)?;
        Ok(Self {
            owner: owner.into(),
            name: name.into(),
            descriptor,
            is_static,
            instructions: InstructionSequence::new(),
            signature,
        })
    }

    pub fn with_instructions(mut self, instructions: InstructionSequence) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Replaces the descriptor. The body is left unchanged if the new one does not parse.
    pub fn set_descriptor(&mut self, descriptor: impl Into<String>) -> Result<()> {
        let descriptor = descriptor.into();
        self.signature = MethodDescriptor::parse(&descriptor)?;
        self.descriptor = descriptor;
        Ok(())
    }

    pub fn signature(&self) -> &MethodDescriptor {
        &self.signature
    }

    /// Local slots holding a value on entry: the receiver (unless static) and the parameters.
    pub fn entry_slots(&self) -> BTreeSet<u16> {
        let mut slots = BTreeSet::new();
        let mut next: u16 = 0;
        if !self.is_static {
            slots.insert(0);
            next = 1;
        }
        for param in &self.signature.params {
            for _ in 0..param.size() {
                slots.insert(next);
                next = next.saturating_add(1);
            }
        }
        slots
    }
}
