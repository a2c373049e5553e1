//! Name resolution between stable logical member names and the names present at runtime.
//!
//! Patches are written against searge-style names (`func_184582_a`, `field_147369_b`). A
//! runtime environment either uses those directly or a readable mapping of them; the resolver
//! turns a logical query into the concrete one to search for.

use crate::matcher::CallSiteDescriptor;
use crate::{Error, Result};
use graft_core::FieldRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps logical member names to runtime names.
pub trait NameResolver {
    fn method_name(&self, name: &str) -> String;

    fn field_name(&self, name: &str) -> String;

    /// Resolves the member name of a call-site query; owner and descriptor pass through.
    fn resolve_method(&self, logical: &CallSiteDescriptor) -> CallSiteDescriptor {
        CallSiteDescriptor {
            name: self.method_name(&logical.name),
            ..logical.clone()
        }
    }

    fn resolve_field(&self, logical: &FieldRef) -> FieldRef {
        FieldRef {
            name: self.field_name(&logical.name),
            ..logical.clone()
        }
    }
}

/// Resolver for environments that run on the logical names themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityResolver;

impl NameResolver for IdentityResolver {
    fn method_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn field_name(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Lookup table from logical to runtime names; unmapped names pass through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    #[serde(default)]
    pub methods: HashMap<String, String>,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

impl MappingTable {
    /// Parses `{"methods": {...}, "fields": {...}}`.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses MCP-style `searge,name,side,desc` exports for methods and fields.
    pub fn from_csv(methods: &str, fields: &str) -> Result<Self> {
        Ok(Self {
            methods: parse_csv(methods)?,
            fields: parse_csv(fields)?,
        })
    }

    pub fn len(&self) -> usize {
        self.methods.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.fields.is_empty()
    }
}

impl NameResolver for MappingTable {
    fn method_name(&self, name: &str) -> String {
        self.methods
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn field_name(&self, name: &str) -> String {
        self.fields
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

fn parse_csv(text: &str) -> Result<HashMap<String, String>> {
    let mut names = HashMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || (idx == 0 && line.starts_with("searge,")) {
            continue;
        }
        let mut columns = line.split(',');
        let (Some(logical), Some(runtime)) = (columns.next(), columns.next()) else {
            return Err(Error::Mapping {
                line: idx + 1,
                msg: "expected at least `searge,name`".into(),
            });
        };
        let (logical, runtime) = (logical.trim(), runtime.trim());
        if logical.is_empty() || runtime.is_empty() {
            return Err(Error::Mapping {
                line: idx + 1,
                msg: "empty name".into(),
            });
        }
        names.insert(logical.to_string(), runtime.to_string());
    }
    Ok(names)
}
