use std::fmt;

/// Errors raised off the audio thread: engine selection and state loading.
///
/// Nothing on the processing path returns these. Pool exhaustion is a
/// sizing bug and panics instead.
#[derive(Debug)]
pub enum EngineError {
    UnknownEngine { name: String },
    IndexOutOfRange { index: usize, len: usize },
    InvalidState { engine: &'static str, source: serde_json::Error },
    MalformedDocument { key: String, reason: &'static str },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownEngine { name } => write!(f, "no engine named '{name}'"),
            EngineError::IndexOutOfRange { index, len } => {
                write!(f, "engine index {index} out of range, {len} engines available")
            }
            EngineError::InvalidState { engine, source } => {
                write!(f, "invalid state for engine '{engine}': {source}")
            }
            EngineError::MalformedDocument { key, reason } => {
                write!(f, "malformed state document at '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::InvalidState { source, .. } => Some(source),
            _ => None,
        }
    }
}
