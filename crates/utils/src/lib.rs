//! Common utility for extended `std` types
//!
//! These are left public for convenience.
//!
//! For example, the fixed six decimal place format expected by the fitting
//! function strings, or prettier formatting for scientific numbers, are
//! useful everywhere.

// Alias for the format! macro
pub use std::format as f;

// Modules
mod option_ext;
mod value_ext;

// Flatten
pub use option_ext::OptionExt;
pub use value_ext::ValueExt;
