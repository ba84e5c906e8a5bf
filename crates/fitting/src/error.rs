//! Result and Error types for ncstools-fitting

// crate modules
use crate::optimizer::OptimizerError;
use crate::driver::Stage;

/// Type alias for Result<T, fitting::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `ncstools-fitting` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Profile(#[from] ncstools_profiles::Error),

    #[error("a fit requires at least one mass component")]
    NoComponents,

    #[error("intensity constraints have {columns} columns but there are {components} mass components")]
    ConstraintColumns { columns: usize, components: usize },

    #[error("invalid number of points for smoothing: {0} (value must be greater than zero)")]
    InvalidSmoothing(i32),

    #[error("invalid bad data error threshold: {0}")]
    InvalidThreshold(f64),

    #[error("invalid x-domain scale factor: {0}")]
    InvalidScale(f64),

    #[error("dataset arrays differ in length (x={x}, y={y}, e={e})")]
    DatasetShape { x: usize, y: usize, e: usize },

    #[error("no data points left to fit")]
    EmptyDataset,

    #[error("global fit requires at least one domain")]
    NoDomains,

    #[error("calculated curve has {found} points but the data has {expected}")]
    CurveLength { expected: usize, found: usize },

    #[error("invalid spectrum selection \"{0}\"")]
    InvalidSelection(String),

    #[error("fitting by bank requires selecting either 'forward' or 'backward', found \"{0}\"")]
    BankSelection(String),

    #[error("failed to load data: {0}")]
    Load(String),

    #[error("optimizer failed at {stage}")]
    Optimizer {
        stage: Stage,
        #[source]
        source: OptimizerError,
    },

    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to (de)serialise")]
    FailedSerde(#[from] serde_json::Error),

    #[error("parser failed: {0}")]
    ParseError(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Self::ParseError(format!("{err:?}"))
    }
}
