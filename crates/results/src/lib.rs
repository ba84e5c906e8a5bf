//! Normalised physical quantities from NCS fit parameters
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod classify;
mod error;
mod summary;
mod transform;

// inline the important parts for a nice public API
#[doc(inline)]
pub use transform::{ResultTransformer, TransformOptions, DEFAULT_PERTURBATION};

#[doc(inline)]
pub use summary::{
    BackgroundSummary, ComponentSummary, Degeneracy, HermiteTerm, Measurement, PhysicalSummary,
};

#[doc(inline)]
pub use classify::{classify, Field};

#[doc(inline)]
pub use error::{Error, Result};
