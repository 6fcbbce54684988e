use thiserror::Error;

/// Guard errors.
///
/// Policy violations are not errors; they are reported through a
/// [`Verdict`](crate::Verdict). These are failures to evaluate at all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The host failed to answer a capability query.
    #[error("capability query failed for {descriptor}: {reason}")]
    Query { descriptor: String, reason: String },

    /// A grant flag could not be parsed.
    #[error("invalid grant flag: {0}")]
    InvalidGrant(String),

    #[error(transparent)]
    Policy(#[from] policy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
