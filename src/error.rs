/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the crate.
///
/// `Interrupted` and `TimedOut` come out of the blocking-wait bridge and are
/// always recoverable: callers unwind the task body and report the outcome.
/// The pool operations themselves never fail; only construction and the
/// shared-instance facade have error paths.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task interrupted")]
    Interrupted,

    #[error("wait timed out")]
    TimedOut,

    #[error("config error: {0}")]
    Config(String),

    #[error("shared pool not initialized")]
    NotInitialized,

    #[error("shared pool already initialized")]
    AlreadyInitialized,
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// True for the cancellation-family conditions (`Interrupted`,
    /// `TimedOut`), which most callers treat identically.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Error::Interrupted | Error::TimedOut)
    }
}
