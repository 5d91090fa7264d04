//! Error types for Horizon UX core systems.

/// The main error type for Horizon UX core operations.
#[derive(Debug, thiserror::Error)]
pub enum UxError {
    /// Timer-related error.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),
}

/// Timer-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// The timer ID is invalid, has already fired, or has been stopped.
    #[error("Invalid or expired timer ID")]
    InvalidTimerId,
}

/// A specialized Result type for Horizon UX core operations.
pub type Result<T> = std::result::Result<T, UxError>;
