// nom parser combinators
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::number::complete::double;
use nom::sequence::{delimited, pair};
use nom::IResult;

/// Double value taking up the whole of the input, ignoring surrounding space
pub(crate) fn whole_f64(i: &str) -> IResult<&str, f64> {
    all_consuming(delimited(multispace0, double, multispace0))(i)
}

/// Signed integer taking up the whole of the input, ignoring surrounding space
pub(crate) fn whole_i64(i: &str) -> IResult<&str, i64> {
    all_consuming(delimited(
        multispace0,
        map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>),
        multispace0,
    ))(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles() {
        assert_eq!(whole_f64(" 1.0079 ").unwrap().1, 1.0079);
        assert_eq!(whole_f64("-4").unwrap().1, -4.0);
        assert_eq!(whole_f64("1e-2").unwrap().1, 0.01);
        assert!(whole_f64("1.0x").is_err());
    }

    #[test]
    fn integers() {
        assert_eq!(whole_i64("3").unwrap().1, 3);
        assert_eq!(whole_i64(" -1").unwrap().1, -1);
        assert!(whole_i64("1.5").is_err());
        assert!(whole_i64("two").is_err());
    }
}
