// All nom parsers split among files for organisation
mod descriptor;
mod number;

// Internal re-exports for convenience
pub(crate) use descriptor::*;
pub(crate) use number::*;

/// More convenient error creation for nom
use nom::error::{Error, ErrorKind};
pub(in crate::parsers) fn cause(s: &str) -> nom::Err<Error<&str>> {
    nom::Err::Error(Error::new(s, ErrorKind::Fail))
}
