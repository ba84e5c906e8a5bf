//! Result and Error types for ncstools-results

/// Type alias for Result<T, results::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `ncstools-results` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no {field} found for mass component {component} in the parameter table")]
    MissingRow { component: usize, field: String },

    #[error("parameter \"{name}\" refers to component {index}, but there are only {count}")]
    IndexOutOfRange {
        name: String,
        index: usize,
        count: usize,
    },

    #[error("perturbation must be positive and finite, found {0}")]
    InvalidPerturbation(f64),

    #[error("failed to (de)serialise")]
    FailedSerde(#[from] serde_json::Error),
}
