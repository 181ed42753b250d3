use thiserror::Error;

/// Errors produced while turning an article into a slide deck.
///
/// The retry policy in `chat::with_retry` only re-attempts kinds that can
/// plausibly succeed on a second call with the same prompt; everything
/// else aborts the run.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text could not be split into a titled section.
    #[error("cannot segment text into a section: {0}")]
    Segmentation(String),

    /// Slide markdown does not match the required block shape.
    #[error("invalid slide structure: {0}")]
    Structure(String),

    /// The speaker note carries no usable reference-status JSON.
    #[error("cannot decode reference status: {0}")]
    Decode(String),

    /// The chat provider reported an upstream failure.
    #[error("chat provider error: {0}")]
    Provider(String),

    /// A tracker or windowing precondition was violated.
    #[error("{0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether another attempt against the same prompt may succeed.
    ///
    /// `Structure` and `Decode` are model-output format failures;
    /// `Provider` is a transient upstream failure. Both are worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Structure(_) | Error::Decode(_) | Error::Provider(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
