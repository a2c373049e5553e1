pub mod hook_patch;
pub mod matcher;
pub mod pass;
pub mod presets;
pub mod resolver;
pub mod splice;

use graft_core::MethodBody;
use thiserror::Error;

/// Transform error type encompassing all transform module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Core operation failed.
    #[error("core operation failed: {0}")]
    Core(#[from] graft_core::result::Error),

    /// The hook does not have the `(item, entity) -> item` shape.
    #[error("invalid hook {hook}: {reason}")]
    InvalidHook {
        /// The hook as `owner.name descriptor`.
        hook: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The field used to reach the owning entity is unusable.
    #[error("invalid receiver field {field}: {reason}")]
    InvalidReceiverField {
        /// The field as `owner.name : descriptor`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Config or mapping JSON could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mapping table line could not be parsed.
    #[error("mapping error at line {line}: {msg}")]
    Mapping {
        /// The 1-based line number.
        line: usize,
        /// Description of the problem.
        msg: String,
    },

    /// No preset with this name exists.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Transform result type
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for method transforms.
pub trait Transform: Send + Sync {
    /// Returns the transform's name for logging and identification.
    fn name(&self) -> &str;
    /// Applies the transform to one method body, returning whether changes were made.
    fn apply(&self, method: &mut MethodBody) -> Result<bool>;
}
