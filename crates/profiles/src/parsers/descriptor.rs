// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, multispace0, space0};
use nom::combinator::{all_consuming, map, opt};
use nom::multi::{separated_list0, separated_list1};
use nom::sequence::{delimited, preceded, separated_pair, terminated};
use nom::IResult;

/// Right hand side of a `key=value` pair
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value<'a> {
    /// Bracketed list, e.g. `[1, 0, 0]`
    List(Vec<&'a str>),
    /// Anything up to the next `,` or `;`
    Scalar(&'a str),
}

/// Ordered `key=value` pairs of one descriptor
pub(crate) type Pairs<'a> = Vec<(&'a str, Value<'a>)>;

/// Identifier on the left of `=`
fn key(i: &str) -> IResult<&str, &str> {
    delimited(
        multispace0,
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
        space0,
    )(i)
}

/// Single entry of a bracketed list
fn item(i: &str) -> IResult<&str, &str> {
    delimited(
        multispace0,
        take_while1(|c: char| !matches!(c, ',' | ']' | '[' | ';') && !c.is_whitespace()),
        multispace0,
    )(i)
}

/// Bracketed, comma separated list of items
pub(crate) fn list(i: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        preceded(multispace0, char('[')),
        separated_list0(char(','), item),
        preceded(multispace0, char(']')),
    )(i)
}

/// Scalar value, trimmed of surrounding whitespace
fn scalar(i: &str) -> IResult<&str, &str> {
    let (i, value) = take_while1(|c: char| !matches!(c, ',' | ';' | '[' | ']'))(i)?;
    match value.trim() {
        "" => Err(super::cause("empty value")),
        v => Ok((i, v)),
    }
}

fn value(i: &str) -> IResult<&str, Value<'_>> {
    preceded(
        space0,
        alt((map(list, Value::List), map(scalar, Value::Scalar))),
    )(i)
}

/// One comma separated descriptor, e.g. `function=Gaussian,width=[2, 5, 7]`
pub(crate) fn descriptor(i: &str) -> IResult<&str, Pairs<'_>> {
    separated_list1(
        preceded(multispace0, char(',')),
        separated_pair(key, char('='), value),
    )(i)
}

/// Semicolon separated descriptors, tolerating a trailing `;`
pub(crate) fn descriptors(i: &str) -> IResult<&str, Vec<Pairs<'_>>> {
    all_consuming(terminated(
        separated_list1(preceded(multispace0, char(';')), descriptor),
        terminated(opt(preceded(multispace0, char(';'))), multispace0),
    ))(i)
}

/// Semicolon separated bracketed lists, tolerating a trailing `;`
pub(crate) fn lists(i: &str) -> IResult<&str, Vec<Vec<&str>>> {
    all_consuming(terminated(
        separated_list1(preceded(multispace0, char(';')), list),
        terminated(opt(preceded(multispace0, char(';'))), multispace0),
    ))(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_list_values() {
        let (_, pairs) = descriptor("function=GramCharlier,width=[2, 5, 7],k_free=0").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("function", Value::Scalar("GramCharlier")),
                ("width", Value::List(vec!["2", "5", "7"])),
                ("k_free", Value::Scalar("0")),
            ]
        );
    }

    #[test]
    fn trailing_separator_is_tolerated() {
        let (_, items) = descriptors("function=Gaussian,width=10;function=Gaussian,width=13;").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1][1], ("width", Value::Scalar("13")));
    }

    #[test]
    fn empty_list() {
        assert_eq!(list("[ ]").unwrap().1, Vec::<&str>::new());
    }

    #[test]
    fn multiple_lists() {
        let (_, rows) = lists("[0, 1, 0, -4]; [1, -1, 0, 0]").unwrap();
        assert_eq!(rows, vec![vec!["0", "1", "0", "-4"], vec!["1", "-1", "0", "0"]]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(descriptors("function").is_err());
        assert!(descriptors("width=[1, 2").is_err());
    }
}
