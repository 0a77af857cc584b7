use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by the engine's public operations.
///
/// Problems inside a parse or analysis task never surface here; they stay
/// local to the entry and are logged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build parse worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to start analysis thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("engine has shut down")]
    ShutDown,

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a source or resource file: {}", .0.display())]
    UnsupportedFile(PathBuf),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = EngineError::Io {
            path: PathBuf::from("/proj/a.py"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to read /proj/a.py"));
        let err = EngineError::UnsupportedFile(PathBuf::from("notes.txt"));
        assert_eq!(err.to_string(), "not a source or resource file: notes.txt");
    }
}
