use thiserror::Error;

/// Input faults caught before any network interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A field does not match its required pattern (document number,
    /// phone, date, SMS code).
    #[error("format error: {0}")]
    Format(String),
    /// Country code absent from the country table.
    #[error("country code {0} not found")]
    CountryNotFound(String),
    /// Procedure code absent from the procedure table.
    #[error("procedure code {0} not found")]
    ProcedureNotFound(String),
}

/// How the retry loop reacts to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Retry immediately with the same session, advancing only the
    /// rejected-office set.
    Office,
    /// Discard the session, clear per-attempt state, sleep the cooldown,
    /// restart from scratch.
    Attempt,
    /// Propagate out; the failure shape is not one we can retry safely.
    Fatal,
}

/// Failure taxonomy for the booking flow.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// This specific office had no acceptable slot.
    #[error("office unavailable: {0}")]
    OfficeUnavailable(String),

    /// Nothing is available anywhere right now.
    #[error("attempt failed: {0}")]
    AttemptFailed(String),

    /// The distance lookup service failed. `fatal` marks a persistent
    /// misconfiguration (e.g. rejected API key) rather than a transient
    /// outage.
    #[error("distance service error: {message}")]
    DistanceService { message: String, fatal: bool },

    /// Transport-level failure talking to the booking service.
    #[error("transport error: {0}")]
    Transport(String),

    /// Expected content could not be located in a server response. The
    /// shape contract with the service is assumed broken; never retried.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The cooldown sleep was cancelled by the caller.
    #[error("cancelled")]
    Cancelled,
}

impl BookingError {
    /// Classify this failure for the retry loop.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            BookingError::OfficeUnavailable(_) => RetryClass::Office,
            BookingError::AttemptFailed(_) => RetryClass::Attempt,
            BookingError::Transport(_) => RetryClass::Attempt,
            BookingError::DistanceService { fatal, .. } => {
                if *fatal {
                    RetryClass::Fatal
                } else {
                    RetryClass::Attempt
                }
            }
            BookingError::Validation(_) | BookingError::Extraction(_) | BookingError::Cancelled => {
                RetryClass::Fatal
            }
        }
    }
}

impl From<reqwest::Error> for BookingError {
    fn from(err: reqwest::Error) -> Self {
        BookingError::Transport(err.to_string())
    }
}

impl From<fantoccini::error::CmdError> for BookingError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        BookingError::Transport(err.to_string())
    }
}
