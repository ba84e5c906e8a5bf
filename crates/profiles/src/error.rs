//! Result and Error types for ncstools-profiles

/// Type alias for Result<T, profiles::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `ncstools-profiles` crate
///
/// Every variant is a configuration error. None of these are recoverable by
/// retrying with the same input.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("unknown function type \"{0}\" (allowed values are GramCharlier, Gaussian)")]
    UnknownProfile(String),

    #[error("width must be a single value or [min, default, max], found {0} values")]
    MalformedWidth(usize),

    #[error("width range is not ordered as min <= default <= max: [{min}, {default}, {max}]")]
    UnorderedWidth { min: f64, default: f64, max: f64 },

    #[error("GramCharlier requested for mass {mass} but no {flag} argument was found")]
    MissingFlag { mass: usize, flag: String },

    #[error("invalid value \"{value}\" for {flag} (expected 0 or 1)")]
    InvalidFlag { flag: String, value: String },

    #[error("GramCharlier requires at least one hermite_coeffs flag")]
    EmptyHermiteFlags,

    #[error("mass must be positive, found {0}")]
    InvalidMass(f64),

    #[error("background order must be a non-negative integer, found \"{0}\"")]
    InvalidBackgroundOrder(String),

    #[error("missing \"{key}\" in descriptor \"{descriptor}\"")]
    MissingKey { key: String, descriptor: String },

    #[error("expected a number for \"{key}\", found \"{value}\"")]
    InvalidNumber { key: String, value: String },

    #[error("no mass values given")]
    EmptyMasses,

    #[error("no mass profiles given")]
    EmptyProfiles,

    #[error("number of profiles ({profiles}) does not match number of masses ({masses})")]
    CountMismatch { masses: usize, profiles: usize },

    #[error("intensity constraint rows have inconsistent lengths (expected {expected}, found {found})")]
    RaggedConstraints { expected: usize, found: usize },

    #[error("parameter \"{0}\" not found in the value table")]
    MissingParameter(String),

    #[error("parser failed: {0}")]
    ParseError(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Self::ParseError(format!("{err:?}"))
    }
}
