//! Error type for timeline reconstruction.

/// Result alias for timeline operations.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors that abort a timeline computation.
///
/// Missing or zero velocity is never reported here; those cases surface as
/// an absent projection or the far-future sentinel date.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    /// Input date could not be parsed
    #[error("Invalid date, index '{index}': {value:?}")]
    InvalidDate {
        /// Position in the input sequence
        index: usize,
        /// Offending raw value
        value: String,
    },

    /// Input is not sorted ascending by date
    #[error("Input out of order at index '{index}': {date} precedes {previous}")]
    OutOfOrder {
        /// Position in the input sequence
        index: usize,
        /// Date found at `index`
        date: chrono::NaiveDate,
        /// Date of the preceding group
        previous: chrono::NaiveDate,
    },

    /// Sprint length must be at least one day
    #[error("Invalid sprint length: {0} days")]
    InvalidSprintLength(i64),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
