//! Defines [`BridgeError`], the unified error type for bridge operations.
//!
//! Provides descriptive error variants for term construction, indexing,
//! comparison, the resume protocol, engine options and streams.  Engine-level
//! failure of a goal is *not* an error; it is the [`Outcome::Failed`]
//! protocol result.
//!
//! [`Outcome::Failed`]: crate::Outcome::Failed

use crate::{Outcome, RefId, RegistryID};
use smartstring::alias::String;
use thiserror::Error;

/// Represents all possible errors that can occur within the bridge.
///
/// [`BridgeError`] provides a single error surface for higher-level functions.
/// Local errors are reported at the offending call and may be handled by the
/// caller.  Fatal errors ([`BridgeError::is_fatal`]) mean the engine and the
/// bridge disagree about the native protocol; the current operation is
/// abandoned and should not be retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("compound term {functor:?} needs at least one argument")]
    InvalidArity { functor: String },

    #[error("index {index} out of range")]
    IndexOutOfRange { index: isize },

    #[error("argument {position} of {functor}/{arity} is not available")]
    RangeError {
        functor: String,
        arity: usize,
        position: usize,
    },

    #[error("a term cannot be ordered against no value")]
    IncomparableType,

    #[error("cut requires a preceding successful resume, last outcome: {0:?}")]
    IllegalCutState(Option<Outcome>),

    #[error("unsupported option id {0}")]
    UnsupportedOption(i32),

    #[error("option {option} expects a {expected} value")]
    InvalidOptionType {
        option: &'static str,
        expected: &'static str,
    },

    #[error("engine rejected option {option} with code {code}")]
    OptionRejected { option: &'static str, code: i32 },

    #[error("options must be set before the engine is initialized")]
    AlreadyInitialized,

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("stale reference {0:?}")]
    StaleReference(RefId),

    #[error("reference belongs to registry {found:?}, expected {expected:?}")]
    ForeignReference {
        expected: RegistryID,
        found: RegistryID,
    },

    #[error("stream {0:?} not found")]
    StreamNotFound(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("unknown native term type")]
    UnknownTermType,

    #[error("unrecognized resume result {0}")]
    UnrecognizedResumeResult(i32),

    #[error("dictionary lookup failed for {0}")]
    DictionaryLookup(String),
}

impl BridgeError {
    /// Returns `true` for errors signalling a protocol mismatch between the
    /// native engine and the bridge.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownTermType
                | BridgeError::UnrecognizedResumeResult(_)
                | BridgeError::DictionaryLookup(_)
        )
    }
}

/// Internal errors raised by the reference registry before they are
/// translated into [`BridgeError`] at the bridge surface.
#[derive(Debug, Clone, Error)]
pub(crate) enum InternalRegistryError {
    /// The reference was issued by another registry.
    #[error("foreign registry: {0:?}")]
    Foreign(RegistryID),

    /// The slot holds no native handle (engine torn down).
    #[error("invalid slot: {0:?}")]
    Invalid(RefId),
}

impl InternalRegistryError {
    pub(crate) fn into_bridge_error(self, expected: RegistryID) -> BridgeError {
        match self {
            InternalRegistryError::Foreign(found) => {
                BridgeError::ForeignReference { expected, found }
            }
            InternalRegistryError::Invalid(id) => BridgeError::StaleReference(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(BridgeError::UnknownTermType.is_fatal());
        assert!(BridgeError::UnrecognizedResumeResult(2).is_fatal());
        assert!(BridgeError::DictionaryLookup("foo/2".into()).is_fatal());
        assert!(!BridgeError::IncomparableType.is_fatal());
        assert!(!BridgeError::IllegalCutState(None).is_fatal());
        assert!(!BridgeError::IndexOutOfRange { index: -4 }.is_fatal());
    }

    #[test]
    fn messages() {
        let e = BridgeError::RangeError {
            functor: "foo".into(),
            arity: 2,
            position: 2,
        };
        assert_eq!(e.to_string(), "argument 2 of foo/2 is not available");
        assert_eq!(
            BridgeError::UnrecognizedResumeResult(2).to_string(),
            "unrecognized resume result 2"
        );
    }
}
