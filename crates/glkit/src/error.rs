//! Error types.

use std::fmt;

use glkit_webgl::constants;
use thiserror::Error;

use crate::types::{ShaderStage, TextureTarget};

/// Result alias used throughout glkit.
pub type Result<T> = std::result::Result<T, GlKitError>;

/// Coarse classification of a [`GlKitError`].
///
/// Survives redaction, so callers can still branch on it when detailed
/// messages are turned off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    InvalidAttributeData,
    CompileFailure,
    LinkFailure,
    UnknownUniform,
    UnknownAttribute,
    ResourceCreationFailure,
    IncompleteFramebuffer,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidAttributeData => "invalid attribute data",
            ErrorKind::CompileFailure => "shader compile",
            ErrorKind::LinkFailure => "program link",
            ErrorKind::UnknownUniform => "unknown uniform",
            ErrorKind::UnknownAttribute => "unknown attribute",
            ErrorKind::ResourceCreationFailure => "resource creation",
            ErrorKind::IncompleteFramebuffer => "incomplete framebuffer",
        };
        f.write_str(name)
    }
}

/// Why a framebuffer failed its completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteReason {
    MissingAttachment,
    DimensionMismatch,
    UnsupportedCombination,
    MultisampleMismatch,
    /// A status the platform returned that has no dedicated reason.
    Unknown(u32),
}

impl IncompleteReason {
    /// Map a `checkFramebufferStatus` result; `None` means complete.
    pub fn from_status(status: u32) -> Option<Self> {
        match status {
            constants::FRAMEBUFFER_COMPLETE => None,
            constants::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => Some(Self::MissingAttachment),
            constants::FRAMEBUFFER_INCOMPLETE_DIMENSIONS => Some(Self::DimensionMismatch),
            constants::FRAMEBUFFER_INCOMPLETE_ATTACHMENT | constants::FRAMEBUFFER_UNSUPPORTED => {
                Some(Self::UnsupportedCombination)
            }
            constants::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => Some(Self::MultisampleMismatch),
            other => Some(Self::Unknown(other)),
        }
    }
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttachment => f.write_str("no attachments"),
            Self::DimensionMismatch => f.write_str("attachment dimensions differ"),
            Self::UnsupportedCombination => f.write_str("unsupported attachment combination"),
            Self::MultisampleMismatch => f.write_str("attachment sample counts differ"),
            Self::Unknown(status) => write!(f, "status 0x{status:04X}"),
        }
    }
}

/// Errors returned by glkit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlKitError {
    /// Malformed description (dimensions, counts, ranges, types).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid data for attribute '{attribute}' in buffer '{buffer}': {reason}")]
    InvalidAttributeData {
        buffer: String,
        attribute: String,
        reason: String,
    },

    #[error("vertex array '{vertex_array}' does not provide attribute '{attribute}' required by program '{program}'")]
    MissingAttribute {
        program: String,
        vertex_array: String,
        attribute: String,
    },

    /// A handle that was deleted, evicted, or never existed.
    #[error("{kind} {id} is not live (deleted or evicted by a context reset)")]
    StaleHandle { kind: &'static str, id: u32 },

    #[error("program '{program}' needs {needed} texture units but only {available} exist")]
    TextureUnitsExhausted {
        program: String,
        needed: usize,
        available: u32,
    },

    #[error("draw call '{draw_call}' binds texture unit {unit} as both {first} and {second}")]
    TextureUnitConflict {
        draw_call: String,
        unit: u32,
        first: TextureTarget,
        second: TextureTarget,
    },

    #[error("failed to compile {stage} shader '{name}':\n{log}")]
    CompileFailure {
        name: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("failed to link program '{name}':\n{log}")]
    LinkFailure { name: String, log: String },

    #[error("program '{program}' has no active uniform '{name}'")]
    UnknownUniform { program: String, name: String },

    #[error("program '{program}' has no active attribute '{name}'")]
    UnknownAttribute { program: String, name: String },

    #[error("failed to create {0}: the context returned no object")]
    ResourceCreation(String),

    #[error("framebuffer '{name}' is incomplete: {reason}")]
    IncompleteFramebuffer {
        name: String,
        reason: IncompleteReason,
    },

    /// Any of the above with the details stripped.
    #[error("{0} error (enable debug mode for details)")]
    Redacted(ErrorKind),
}

impl GlKitError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::MissingAttribute { .. }
            | Self::StaleHandle { .. }
            | Self::TextureUnitsExhausted { .. }
            | Self::TextureUnitConflict { .. } => ErrorKind::Validation,
            Self::InvalidAttributeData { .. } => ErrorKind::InvalidAttributeData,
            Self::CompileFailure { .. } => ErrorKind::CompileFailure,
            Self::LinkFailure { .. } => ErrorKind::LinkFailure,
            Self::UnknownUniform { .. } => ErrorKind::UnknownUniform,
            Self::UnknownAttribute { .. } => ErrorKind::UnknownAttribute,
            Self::ResourceCreation(_) => ErrorKind::ResourceCreationFailure,
            Self::IncompleteFramebuffer { .. } => ErrorKind::IncompleteFramebuffer,
            Self::Redacted(kind) => *kind,
        }
    }

    /// Strip the details, keeping only the kind.
    pub fn redact(self) -> Self {
        match self {
            Self::Redacted(_) => self,
            other => Self::Redacted(other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_redaction() {
        let err = GlKitError::UnknownUniform {
            program: "sky".into(),
            name: "u_tme".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UnknownUniform);

        let redacted = err.redact();
        assert_eq!(redacted, GlKitError::Redacted(ErrorKind::UnknownUniform));
        assert_eq!(redacted.kind(), ErrorKind::UnknownUniform);
        assert!(!redacted.to_string().contains("u_tme"));
    }

    #[test]
    fn test_redact_is_idempotent() {
        let err = GlKitError::validation("bad").redact();
        assert_eq!(err.clone().redact(), err);
    }

    #[test]
    fn test_incomplete_reason_from_status() {
        assert_eq!(IncompleteReason::from_status(constants::FRAMEBUFFER_COMPLETE), None);
        assert_eq!(
            IncompleteReason::from_status(constants::FRAMEBUFFER_INCOMPLETE_DIMENSIONS),
            Some(IncompleteReason::DimensionMismatch)
        );
        assert_eq!(
            IncompleteReason::from_status(constants::FRAMEBUFFER_UNSUPPORTED),
            Some(IncompleteReason::UnsupportedCombination)
        );
        assert_eq!(IncompleteReason::from_status(0x1234), Some(IncompleteReason::Unknown(0x1234)));
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = GlKitError::MissingAttribute {
            program: "lit".into(),
            vertex_array: "quad".into(),
            attribute: "a_pos".into(),
        };
        assert!(err.to_string().contains("a_pos"));
    }
}
