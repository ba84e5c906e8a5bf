//! Two-stage composite function fitting for NCS spectra
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod config;
mod data;
mod driver;
mod error;
mod optimizer;
mod options;
mod result;
mod selection;
mod spec;

// inline the important parts for a nice public API
#[doc(inline)]
pub use spec::{CompositeFunction, CompositeKind, FitSpec, RenderMode};

#[doc(inline)]
pub use driver::{DriverState, FitDriver, Stage, SIMULATION_ITERATIONS, STAGE2_ITERATIONS};

#[doc(inline)]
pub use optimizer::{
    FitRequest, Optimizer, OptimizerError, OptimizerOutput, ParameterRow, ParameterTable,
};

#[doc(inline)]
pub use options::{FitOptions, DEFAULT_DOMAIN_SCALE, DEFAULT_MAX_ITERATIONS, DEFAULT_MINIMIZER};

#[doc(inline)]
pub use config::{
    read_config, BackgroundConfig, ConstraintsConfig, FitConfig, MassConfig, WidthConfig,
};

#[doc(inline)]
pub use data::{DataLoader, Dataset, DomainScale, FitCurve};

#[doc(inline)]
pub use result::FitResult;

#[doc(inline)]
pub use selection::{
    DetectorGroups, FitIdentity, FitMode, SpectrumRange, SpectrumSelection, Vesuvio,
};

#[doc(inline)]
pub use error::{Error, Result};
