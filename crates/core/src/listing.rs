//! Textual method listings.
//!
//! A listing starts with a `.method` header and holds one record per line:
//!
//! ```text
//! .method net/minecraft/network/play/ServerPlayNetHandler func_147357_a (Lnet/minecraft/network/play/client/CEntityActionPacket;)V
//! L0:
//!   ALOAD 0
//!   GETFIELD net/minecraft/network/play/ServerPlayNetHandler.field_147369_b : Lnet/minecraft/entity/player/ServerPlayerEntity;
//!   INVOKEVIRTUAL net/minecraft/entity/player/ServerPlayerEntity.func_184582_a (Lnet/minecraft/inventory/EquipmentSlotType;)Lnet/minecraft/item/ItemStack;
//!   IFEQ L0
//! ```
//!
//! `#` starts a comment. [`MethodBody`]'s `Display` writes the same format back.

use crate::Opcode;
use crate::descriptor::{FieldType, MethodDescriptor};
use crate::instruction::{Constant, DispatchKind, FieldRef, Instruction, MethodRef, Payload};
use crate::method::MethodBody;
use crate::opcode::OperandKind;
use crate::result::{Error, Result};
use std::fmt;
use std::path::Path;

/// Reads and parses a listing file.
pub fn read_listing(path: impl AsRef<Path>) -> Result<MethodBody> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.display().to_string(),
        source,
    })?;
    parse_listing(&text)
}

/// Parses a listing into a method body.
pub fn parse_listing(text: &str) -> Result<MethodBody> {
    let mut method: Option<MethodBody> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let err = |msg: String| Error::ParseError {
            line: line_no,
            msg,
            raw: raw.to_string(),
        };

        if let Some(header) = line.strip_prefix(".method") {
            if method.is_some() {
                return Err(err("duplicate .method header".into()));
            }
            method = Some(parse_header(header).map_err(err)?);
            continue;
        }

        let Some(body) = method.as_mut() else {
            return Err(err("missing .method header".into()));
        };

        let insn = parse_instruction(line).map_err(err)?;
        body.instructions.push(insn);
    }

    method.ok_or_else(|| Error::ParseError {
        line: 0,
        msg: "empty listing".into(),
        raw: text.to_string(),
    })
}

fn parse_header(header: &str) -> std::result::Result<MethodBody, String> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    let (owner, name, descriptor, is_static) = match parts.as_slice() {
        [owner, name, desc] => (*owner, *name, *desc, false),
        [owner, name, desc, "static"] => (*owner, *name, *desc, true),
        _ => return Err("expected `.method <owner> <name> <descriptor> [static]`".into()),
    };
    MethodBody::new(owner, name, descriptor, is_static).map_err(|e| e.to_string())
}

/// Parses a single record as written by `Instruction`'s `Display`.
pub fn parse_instruction(line: &str) -> std::result::Result<Instruction, String> {
    if let Some(label) = line.strip_suffix(':')
        && is_label_name(label)
    {
        return Ok(Instruction::label(label));
    }

    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, rest.trim()),
        None => (line, ""),
    };
    let op: Opcode = mnemonic.parse().map_err(|e: Error| e.to_string())?;

    let payload = match op.operand_kind() {
        OperandKind::None => {
            if !rest.is_empty() {
                return Err(format!("{op} takes no operand"));
            }
            Payload::None
        }
        OperandKind::Int => Payload::Int(
            rest.parse()
                .map_err(|_| format!("invalid integer operand '{rest}'"))?,
        ),
        OperandKind::Constant => Payload::Constant(parse_constant(rest)?),
        OperandKind::Var => Payload::Var(parse_slot(rest)?),
        OperandKind::Iinc => {
            let (slot, delta) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "IINC expects `<slot> <delta>`".to_string())?;
            Payload::Iinc {
                slot: parse_slot(slot)?,
                delta: delta
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid increment '{delta}'"))?,
            }
        }
        OperandKind::Jump | OperandKind::Label => {
            if !is_label_name(rest) {
                return Err(format!("invalid label '{rest}'"));
            }
            if op == Opcode::LABEL {
                Payload::Label(rest.to_string())
            } else {
                Payload::Jump(rest.to_string())
            }
        }
        OperandKind::Field => Payload::Field(parse_field_ref(rest)?),
        OperandKind::Method => {
            let kind = DispatchKind::from_opcode(op)
                .ok_or_else(|| format!("{op} is not an invoke opcode"))?;
            Payload::Method(parse_method_ref(kind, rest)?)
        }
        OperandKind::Type => {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                return Err(format!("{op} expects a single type name"));
            }
            Payload::Type(rest.to_string())
        }
    };

    Instruction::new(op, payload).map_err(|e| e.to_string())
}

fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_slot(text: &str) -> std::result::Result<u16, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("invalid local slot '{text}'"))
}

/// Splits `owner.name` on the last dot; owners use `/` as their package separator.
fn split_member(text: &str) -> std::result::Result<(&str, &str), String> {
    match text.rsplit_once('.') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(format!("expected `owner.name`, got '{text}'")),
    }
}

fn parse_field_ref(text: &str) -> std::result::Result<FieldRef, String> {
    let (member, descriptor) = text
        .split_once(" : ")
        .ok_or_else(|| "expected `owner.name : descriptor`".to_string())?;
    let (owner, name) = split_member(member.trim())?;
    let descriptor = descriptor.trim();
    FieldType::parse(descriptor).map_err(|e| e.to_string())?;
    Ok(FieldRef::new(owner, name, descriptor))
}

fn parse_method_ref(kind: DispatchKind, text: &str) -> std::result::Result<MethodRef, String> {
    let mut parts = text.split_whitespace();
    let (Some(member), Some(descriptor), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("expected `owner.name descriptor`".into());
    };
    let (owner, name) = split_member(member)?;
    MethodDescriptor::parse(descriptor).map_err(|e| e.to_string())?;
    Ok(MethodRef::new(kind, owner, name, descriptor))
}

fn parse_constant(text: &str) -> std::result::Result<Constant, String> {
    if let Some(quoted) = text.strip_prefix('"') {
        return parse_string_literal(quoted).map(Constant::String);
    }
    if text.starts_with('L') || text.starts_with('[') {
        FieldType::parse(text).map_err(|e| e.to_string())?;
        return Ok(Constant::Type(text.to_string()));
    }

    let bad = || format!("invalid constant '{text}'");
    if let Some(v) = text.strip_suffix('L') {
        return v.parse().map(Constant::Long).map_err(|_| bad());
    }
    if let Some(v) = text.strip_suffix('F') {
        return v.parse().map(Constant::Float).map_err(|_| bad());
    }
    if let Some(v) = text.strip_suffix('D') {
        return v.parse().map(Constant::Double).map_err(|_| bad());
    }
    text.parse().map(Constant::Int).map_err(|_| bad())
}

/// Parses the body of a string literal after its opening quote.
fn parse_string_literal(body: &str) -> std::result::Result<String, String> {
    let mut out = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                return if chars.as_str().trim().is_empty() {
                    Ok(out)
                } else {
                    Err("trailing characters after string literal".into())
                };
            }
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some(escaped @ ('"' | '\\')) => out.push(escaped),
                _ => return Err("invalid escape in string literal".into()),
            },
            other => out.push(other),
        }
    }
    Err("unterminated string literal".into())
}

/// Cuts a `#` comment, ignoring `#` inside string literals.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..idx],
            _ => {}
        }
    }
    line
}

/// The `.method` line that opens a listing.
pub fn header_line(method: &MethodBody) -> String {
    let suffix = if method.is_static { " static" } else { "" };
    format!(
        ".method {} {} {}{}",
        method.owner,
        method.name,
        method.descriptor(),
        suffix
    )
}

/// Leading whitespace of a record line; labels sit in the first column.
pub fn record_indent(insn: &Instruction) -> &'static str {
    if insn.op() == Opcode::LABEL { "" } else { "  " }
}

impl fmt::Display for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", header_line(self))?;
        for insn in self.instructions.instructions() {
            writeln!(f, "{}{insn}", record_indent(insn))?;
        }
        Ok(())
    }
}
