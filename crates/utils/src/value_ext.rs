use crate::f;

/// Extends primitives with more specific formatting options
pub trait ValueExt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// Works for anything that can be represented as scientific using the
    /// `LowerExp` trait, which is pretty much every numerical primitive.
    ///
    /// ```rust
    /// # use ncstools_utils::ValueExt;
    /// let number = -1.0_f64;
    /// assert_eq!(number.sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((1.0_f64).sci(5, 2), "1.00000e+00".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;

    /// Fixed notation with six decimal places
    ///
    /// Every numeric value written into a function, tie, or constraint string
    /// uses this format so that generated strings are stable and comparable.
    ///
    /// ```rust
    /// # use ncstools_utils::ValueExt;
    /// assert_eq!(5.0_f64.fixed(), "5.000000".to_string());
    /// assert_eq!((-0.25_f64).fixed(), "-0.250000".to_string());
    /// assert_eq!(1.0079_f64.fixed(), "1.007900".to_string());
    /// ```
    fn fixed(&self) -> String;
}

impl<T: std::fmt::LowerExp + std::fmt::Display> ValueExt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        let Some(split) = num.find('e') else {
            return num;
        };
        let exp = num.split_off(split);
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }

    fn fixed(&self) -> String {
        f!("{:.6}", &self)
    }
}
