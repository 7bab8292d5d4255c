use thiserror::Error;

/// Boxed error type accepted from stage implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single failure a pipeline run settles with.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage refused the input.
    #[error("Stage rejected input: {0}")]
    Rejected(String),

    /// A stage's own work failed.
    #[error("Stage failed: {0}")]
    Stage(#[source] BoxError),

    /// A stage panicked while it was being invoked.
    #[error("Stage panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// Builds a [`PipelineError::Rejected`] from a message.
    pub fn reject(reason: impl Into<String>) -> Self {
        PipelineError::Rejected(reason.into())
    }

    /// Wraps an arbitrary error raised inside a stage.
    pub fn stage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::Stage(Box::new(err))
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, PipelineError::Rejected(_))
    }
}

impl From<BoxError> for PipelineError {
    fn from(err: BoxError) -> Self {
        PipelineError::Stage(err)
    }
}

/// Crate-wide result alias.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_reject_message() {
        let err = PipelineError::reject("bad input");
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Stage rejected input: bad input");
    }

    #[test]
    fn test_stage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = PipelineError::stage(io);
        assert!(!err.is_rejection());
        assert_eq!(err.to_string(), "Stage failed: disk gone");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_box_error() {
        let boxed: BoxError = "plain message".into();
        let err: PipelineError = boxed.into();
        assert!(matches!(err, PipelineError::Stage(_)));
    }
}
