//! Mass profile models, width constraints and ties
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod background;
mod component;
mod constraints;
mod descriptor;
mod error;
mod fragment;
mod intensity;
mod parsers;
mod values;

// inline the important parts for a nice public API
#[doc(inline)]
pub use component::{
    hermite_name, FseMode, GramCharlier, MassComponent, Profile, ProfileKind, SearsFlag,
    WidthSpec, SEARS_FACTOR,
};

#[doc(inline)]
pub use constraints::{build_constraints, build_ties, join, Constraint, Tie};

#[doc(inline)]
pub use background::{Background, DEFAULT_BACKGROUND};

#[doc(inline)]
pub use intensity::IntensityConstraints;

#[doc(inline)]
pub use fragment::{AttributeValue, Fragment};

#[doc(inline)]
pub use values::ParameterValues;

#[doc(inline)]
pub use descriptor::{parse_background, parse_intensity_constraints, parse_profiles};

#[doc(inline)]
pub use error::{Error, Result};
