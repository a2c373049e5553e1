//! Operand-stack and local-slot state at a position in a method body.
//!
//! This is a forward, linear simulation, not a data-flow analysis. Branch targets inherit the
//! stack recorded at the first forward jump that reaches them; code that follows an
//! unconditional transfer is unknown until such a label is seen. Slots count as assigned if the
//! method receives them on entry or if any store precedes the position in code order. Slots
//! written by a store before the position are also reported as clobbered, so callers can tell
//! an entry value (such as `this` in slot 0) from whatever was stored over it.

use crate::{Opcode, is_terminal_opcode};
use crate::descriptor::{FieldType, MethodDescriptor};
use crate::instruction::{Instruction, Payload};
use crate::method::MethodBody;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Snapshot of the state immediately before the record at `position` executes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalContext {
    pub position: usize,
    /// Width (1 or 2 words) of each value on the operand stack, bottom first. `None` when the
    /// simulation could not follow the code up to this point.
    stack: Option<Vec<u8>>,
    assigned: BTreeSet<u16>,
    clobbered: BTreeSet<u16>,
}

impl LocalContext {
    /// Computes the context before the record at `position`.
    pub fn at(method: &MethodBody, position: usize) -> Self {
        let mut sim = Simulation::new(method);
        for (_, _, insn) in method.instructions.range(0..position) {
            sim.step(insn);
        }
        sim.snapshot(position.min(method.instructions.len()))
    }

    /// Computes the context before every record, in a single pass.
    pub fn all(method: &MethodBody) -> Vec<Self> {
        let mut sim = Simulation::new(method);
        let mut out = Vec::with_capacity(method.instructions.len());
        for (pos, (_, insn)) in method.instructions.iter().enumerate() {
            out.push(sim.snapshot(pos));
            sim.step(insn);
        }
        out
    }

    /// Number of values on the operand stack.
    pub fn stack_depth(&self) -> Option<usize> {
        self.stack.as_ref().map(Vec::len)
    }

    /// Operand stack size in words, as counted by `max_stack`.
    pub fn stack_words(&self) -> Option<usize> {
        self.stack
            .as_ref()
            .map(|stack| stack.iter().map(|w| *w as usize).sum())
    }

    /// Width of the value on top of the stack.
    pub fn top_width(&self) -> Option<u8> {
        self.stack.as_ref().and_then(|stack| stack.last().copied())
    }

    pub fn is_assigned(&self, slot: u16) -> bool {
        self.assigned.contains(&slot)
    }

    pub fn assigned_slots(&self) -> impl Iterator<Item = u16> + '_ {
        self.assigned.iter().copied()
    }

    /// Whether a store to `slot` precedes the position, replacing the value it held on entry.
    pub fn is_clobbered(&self, slot: u16) -> bool {
        self.clobbered.contains(&slot)
    }
}

struct Simulation {
    stack: Option<Vec<u8>>,
    assigned: BTreeSet<u16>,
    clobbered: BTreeSet<u16>,
    at_labels: HashMap<String, Vec<u8>>,
}

impl Simulation {
    fn new(method: &MethodBody) -> Self {
        Self {
            stack: Some(Vec::new()),
            assigned: method.entry_slots(),
            clobbered: BTreeSet::new(),
            at_labels: HashMap::new(),
        }
    }

    fn snapshot(&self, position: usize) -> LocalContext {
        LocalContext {
            position,
            stack: self.stack.clone(),
            assigned: self.assigned.clone(),
            clobbered: self.clobbered.clone(),
        }
    }

    fn step(&mut self, insn: &Instruction) {
        if let Some(name) = insn.label_name() {
            if let Some(recorded) = self.at_labels.get(name) {
                match &self.stack {
                    None => self.stack = Some(recorded.clone()),
                    Some(current) if current != recorded => {
                        tracing::warn!(
                            "Stack mismatch at label {}: fallthrough {:?}, jump {:?}",
                            name,
                            current,
                            recorded
                        );
                    }
                    Some(_) => {}
                }
            }
            return;
        }

        if let Some(slot) = stored_slot(insn) {
            let wide = matches!(insn.op(), Opcode::LSTORE | Opcode::DSTORE);
            for written in [Some(slot), wide.then_some(slot.saturating_add(1))]
                .into_iter()
                .flatten()
            {
                self.assigned.insert(written);
                self.clobbered.insert(written);
            }
        }

        let Some(stack) = self.stack.as_mut() else {
            return;
        };

        if apply(stack, insn).is_none() {
            tracing::debug!("Lost track of the operand stack at {}", insn);
            self.stack = None;
            return;
        }

        if let Some(target) = insn.jump_target() {
            self.at_labels
                .entry(target.to_string())
                .or_insert_with(|| stack.clone());
        }

        if ends_flow(insn.op()) {
            self.stack = None;
        }
    }
}

fn stored_slot(insn: &Instruction) -> Option<u16> {
    match insn.op() {
        Opcode::ISTORE | Opcode::LSTORE | Opcode::FSTORE | Opcode::DSTORE | Opcode::ASTORE => {
            insn.var_slot()
        }
        _ => None,
    }
}

fn ends_flow(op: Opcode) -> bool {
    op == Opcode::GOTO || is_terminal_opcode(op)
}

fn pop(stack: &mut Vec<u8>, width: u8) -> Option<()> {
    (stack.pop()? == width).then_some(())
}

fn pop_n(stack: &mut Vec<u8>, count: usize) -> Option<()> {
    for _ in 0..count {
        pop(stack, 1)?;
    }
    Some(())
}

fn width(ty: &FieldType) -> u8 {
    ty.size() as u8
}

/// Applies the stack effect of one instruction; `None` on underflow or a shape mismatch.
fn apply(stack: &mut Vec<u8>, insn: &Instruction) -> Option<()> {
    use Opcode::*;
    match insn.op() {
        NOP | LABEL | IINC | GOTO | RETURN => {}

        ACONST_NULL | ICONST_M1 | ICONST_0 | ICONST_1 | ICONST_2 | ICONST_3 | ICONST_4
        | ICONST_5 | FCONST_0 | FCONST_1 | FCONST_2 | BIPUSH | SIPUSH | ILOAD | FLOAD | ALOAD
        | NEW => stack.push(1),
        LCONST_0 | LCONST_1 | DCONST_0 | DCONST_1 | LLOAD | DLOAD => stack.push(2),
        LDC => match insn.payload() {
            Payload::Constant(constant) => stack.push(constant.size() as u8),
            _ => return None,
        },

        ISTORE | FSTORE | ASTORE | IRETURN | FRETURN | ARETURN | ATHROW | IFEQ | IFNE | IFLT
        | IFGE | IFGT | IFLE | IFNULL | IFNONNULL | MONITORENTER | MONITOREXIT | POP => {
            pop(stack, 1)?
        }
        LSTORE | DSTORE | LRETURN | DRETURN => pop(stack, 2)?,

        IF_ICMPEQ | IF_ICMPNE | IF_ICMPLT | IF_ICMPGE | IF_ICMPGT | IF_ICMPLE | IF_ACMPEQ
        | IF_ACMPNE => pop_n(stack, 2)?,

        IADD | ISUB | IMUL | IDIV | IREM | IAND | IOR | IXOR => {
            pop_n(stack, 2)?;
            stack.push(1);
        }
        INEG | CHECKCAST | INSTANCEOF | ANEWARRAY | ARRAYLENGTH => {
            pop(stack, 1)?;
            stack.push(1);
        }

        POP2 => {
            if stack.last() == Some(&2) {
                stack.pop();
            } else {
                pop_n(stack, 2)?;
            }
        }
        DUP => {
            let top = *stack.last()?;
            if top != 1 {
                return None;
            }
            stack.push(1);
        }
        DUP_X1 => {
            let len = stack.len();
            if len < 2 || stack[len - 1] != 1 || stack[len - 2] != 1 {
                return None;
            }
            stack.insert(len - 2, 1);
        }
        DUP_X2 => {
            let len = stack.len();
            if len < 2 || stack[len - 1] != 1 {
                return None;
            }
            if stack[len - 2] == 2 {
                stack.insert(len - 2, 1);
            } else if len >= 3 && stack[len - 2] == 1 && stack[len - 3] == 1 {
                stack.insert(len - 3, 1);
            } else {
                return None;
            }
        }
        DUP2 => {
            let len = stack.len();
            match *stack.last()? {
                2 => stack.push(2),
                _ if len >= 2 && stack[len - 2] == 1 => stack.extend_from_slice(&[1, 1]),
                _ => return None,
            }
        }
        SWAP => {
            let len = stack.len();
            if len < 2 || stack[len - 1] != 1 || stack[len - 2] != 1 {
                return None;
            }
        }

        GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD => {
            let field = insn.field_ref()?;
            let ty = FieldType::parse(&field.descriptor).ok()?;
            match insn.op() {
                GETSTATIC => stack.push(width(&ty)),
                PUTSTATIC => pop(stack, width(&ty))?,
                GETFIELD => {
                    pop(stack, 1)?;
                    stack.push(width(&ty));
                }
                _ => {
                    pop(stack, width(&ty))?;
                    pop(stack, 1)?;
                }
            }
        }

        INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC | INVOKEINTERFACE => {
            let method = insn.method_ref()?;
            let desc = MethodDescriptor::parse(&method.descriptor).ok()?;
            for param in desc.params.iter().rev() {
                pop(stack, width(param))?;
            }
            if method.kind.has_receiver() {
                pop(stack, 1)?;
            }
            if let Some(ret) = &desc.ret {
                stack.push(width(ret));
            }
        }
    }
    Some(())
}
