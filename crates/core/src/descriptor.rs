//! Field and method descriptor parsing.
//!
//! Only the shape matters here: how many values a call consumes and produces, how wide each
//! value is on the operand stack, and how many local slots the parameters occupy.

use crate::result::{Error, Result};
use std::fmt;

/// A parsed field type, e.g. `I`, `Ljava/lang/String;` or `[[J`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Parses a complete field descriptor.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let (ty, rest) = parse_field_type(descriptor, descriptor)?;
        if !rest.is_empty() {
            return Err(invalid(descriptor, format!("trailing characters '{rest}'")));
        }
        Ok(ty)
    }

    /// Stack and local-slot width: 2 for `long`/`double`, 1 otherwise.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            FieldType::Long | FieldType::Double => 2,
            _ => 1,
        }
    }

    /// Returns true for object and array types.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Object(_) | FieldType::Array(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Byte => f.write_str("B"),
            FieldType::Char => f.write_str("C"),
            FieldType::Double => f.write_str("D"),
            FieldType::Float => f.write_str("F"),
            FieldType::Int => f.write_str("I"),
            FieldType::Long => f.write_str("J"),
            FieldType::Short => f.write_str("S"),
            FieldType::Boolean => f.write_str("Z"),
            FieldType::Object(name) => write!(f, "L{name};"),
            FieldType::Array(inner) => write!(f, "[{inner}"),
        }
    }
}

/// A parsed method descriptor, e.g. `(Lnet/minecraft/item/ItemStack;)Z`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    /// `None` for `void`.
    pub ret: Option<FieldType>,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let body = descriptor
            .strip_prefix('(')
            .ok_or_else(|| invalid(descriptor, "missing '('"))?;
        let close = body
            .find(')')
            .ok_or_else(|| invalid(descriptor, "missing ')'"))?;

        let mut params = Vec::new();
        let mut rest = &body[..close];
        while !rest.is_empty() {
            let (ty, tail) = parse_field_type(rest, descriptor)?;
            params.push(ty);
            rest = tail;
        }

        let ret = match &body[close + 1..] {
            "V" => None,
            "" => return Err(invalid(descriptor, "missing return type")),
            other => Some(FieldType::parse(other).map_err(|_| {
                invalid(descriptor, format!("bad return type '{other}'"))
            })?),
        };

        Ok(Self { params, ret })
    }

    /// Number of local slots the parameters occupy, not counting a receiver.
    pub fn param_slots(&self) -> usize {
        self.params.iter().map(FieldType::size).sum()
    }

    /// Stack width of the return value (0 for `void`).
    pub fn return_size(&self) -> usize {
        self.ret.as_ref().map_or(0, FieldType::size)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        match &self.ret {
            Some(ret) => write!(f, "{ret}"),
            None => f.write_str("V"),
        }
    }
}

fn parse_field_type<'a>(input: &'a str, whole: &str) -> Result<(FieldType, &'a str)> {
    let mut chars = input.chars();
    let tag = chars
        .next()
        .ok_or_else(|| invalid(whole, "unexpected end of descriptor"))?;
    let rest = chars.as_str();
    let ty = match tag {
        'B' => FieldType::Byte,
        'C' => FieldType::Char,
        'D' => FieldType::Double,
        'F' => FieldType::Float,
        'I' => FieldType::Int,
        'J' => FieldType::Long,
        'S' => FieldType::Short,
        'Z' => FieldType::Boolean,
        'L' => {
            let end = rest
                .find(';')
                .ok_or_else(|| invalid(whole, "unterminated object type"))?;
            if end == 0 {
                return Err(invalid(whole, "empty class name"));
            }
            return Ok((FieldType::Object(rest[..end].to_string()), &rest[end + 1..]));
        }
        '[' => {
            let (inner, tail) = parse_field_type(rest, whole)?;
            return Ok((FieldType::Array(Box::new(inner)), tail));
        }
        other => return Err(invalid(whole, format!("unexpected '{other}'"))),
    };
    Ok((ty, rest))
}

fn invalid(descriptor: &str, msg: impl Into<String>) -> Error {
    Error::InvalidDescriptor {
        descriptor: descriptor.to_string(),
        msg: msg.into(),
    }
}
