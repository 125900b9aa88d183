//! Error types for renderer hosting

use thiserror::Error;

/// Host error type
///
/// Every operation on the controller, a handle, or the engine port reports
/// failures through this type. Callers surface errors (log or status display)
/// and never retry automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Engine module failed to load or was used before initialization
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// A live instance already occupies the target surface
    #[error("Target '{target}' already has a renderer")]
    DuplicateTarget { target: String },

    /// The engine rejected an effect script; the previous script stays active
    #[error("Malformed effect for '{target}': {reason}")]
    MalformedEffect { target: String, reason: String },

    /// Operation on a handle whose instance was destroyed
    #[error("Renderer '{target}' was already destroyed")]
    UseAfterDestroy { target: String },

    /// The engine could not interpret the canvas content
    #[error("Invalid canvas for '{target}': {reason}")]
    InvalidCanvas { target: String, reason: String },

    /// Any other engine-reported failure
    #[error("Engine error on '{target}': {message}")]
    Engine { target: String, message: String },
}

impl HostError {
    /// Whether the affected instance keeps its last-known-good state.
    ///
    /// Recoverable errors leave the instance untouched. Anything else means
    /// the instance state is unknown and it must be destroyed and recreated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HostError::DuplicateTarget { .. }
                | HostError::MalformedEffect { .. }
                | HostError::InvalidCanvas { .. }
        )
    }

    /// Target surface the error refers to, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            HostError::Initialization(_) => None,
            HostError::DuplicateTarget { target }
            | HostError::MalformedEffect { target, .. }
            | HostError::UseAfterDestroy { target }
            | HostError::InvalidCanvas { target, .. }
            | HostError::Engine { target, .. } => Some(target),
        }
    }
}

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let malformed = HostError::MalformedEffect {
            target: "canvas1".to_string(),
            reason: "unexpected ')'".to_string(),
        };
        assert!(malformed.is_recoverable());

        let engine = HostError::Engine {
            target: "canvas1".to_string(),
            message: "lost context".to_string(),
        };
        assert!(!engine.is_recoverable());
        assert!(!HostError::Initialization("boom".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_target() {
        let err = HostError::UseAfterDestroy {
            target: "canvas2".to_string(),
        };
        assert_eq!(err.target(), Some("canvas2"));
        assert_eq!(err.to_string(), "Renderer 'canvas2' was already destroyed");
        assert_eq!(HostError::Initialization("x".into()).target(), None);
    }
}
