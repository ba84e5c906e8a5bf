//! `ncstools` is a semi-modular toolkit for fitting neutron Compton
//! scattering spectra
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use ncstools_utils as utils;

#[cfg(feature = "profiles")]
#[cfg_attr(docsrs, doc(cfg(feature = "profiles")))]
#[doc(inline)]
pub use ncstools_profiles as profiles;

#[cfg(feature = "fitting")]
#[cfg_attr(docsrs, doc(cfg(feature = "fitting")))]
#[doc(inline)]
pub use ncstools_fitting as fitting;

#[cfg(feature = "results")]
#[cfg_attr(docsrs, doc(cfg(feature = "results")))]
#[doc(inline)]
pub use ncstools_results as results;
