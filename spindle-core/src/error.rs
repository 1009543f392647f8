//! Engine error types

use thiserror::Error;

/// Errors surfaced to the user by transport operations.
///
/// None of these are fatal; the engine stays usable after every one of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("No media loaded")]
    NoMediaLoaded,
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),
}

impl EngineError {
    /// Message suitable for the status line
    pub fn user_message(&self) -> String {
        match self {
            EngineError::NoMediaLoaded => {
                "Choose an audio file first (:load <path>).".to_string()
            }
            EngineError::PlaybackBlocked(reason) => format!(
                "Playback was blocked ({}). Press play again, or try a different audio file.",
                reason
            ),
        }
    }
}

/// Failure to bring up the audio graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Audio graph unavailable: {0}")]
pub struct GraphError(pub String);

impl From<GraphError> for EngineError {
    fn from(err: GraphError) -> Self {
        EngineError::PlaybackBlocked(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_becomes_blocked() {
        let err: EngineError = GraphError("no device".into()).into();
        assert_eq!(err, EngineError::PlaybackBlocked("no device".into()));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let none = EngineError::NoMediaLoaded.user_message();
        let blocked = EngineError::PlaybackBlocked("policy".into()).user_message();
        assert!(none.contains("Choose an audio file"));
        assert!(blocked.contains("policy"));
        assert_ne!(none, blocked);
    }
}
