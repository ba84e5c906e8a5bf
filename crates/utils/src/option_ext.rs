use crate::f;

/// Extends Option for report formatting
pub trait OptionExt {
    /// Display the contained value, or a placeholder for `None`
    ///
    /// Optional settings such as smoothing read better in a report as a
    /// word than as `None`.
    ///
    /// ```rust
    /// # use ncstools_utils::OptionExt;
    /// let points: Option<i32> = Some(3);
    /// assert_eq!(points.display_or("off"), "3");
    ///
    /// let threshold: Option<f64> = None;
    /// assert_eq!(threshold.display_or("no mask"), "no mask");
    /// ```
    fn display_or(&self, placeholder: &str) -> String;
}

impl<T: std::fmt::Display> OptionExt for Option<T> {
    fn display_or(&self, placeholder: &str) -> String {
        match self {
            Some(value) => f!("{value}"),
            None => placeholder.to_string(),
        }
    }
}
