use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    ops::AddAssign,
};

/// Represents a click-through rate.
///
/// The rate is stored as the raw click and impression counts it was computed
/// from, so that rates can be summed exactly. When there are no impressions
/// the rate is undefined: [`Ctr::value`] returns `None` and the [`Display`]
/// implementation prints `N/A`.
///
/// Equality compares the stored counts, not the rates: `Ctr::new(1, 10)` and
/// `Ctr::new(2, 20)` are different values with the same rate. Use
/// [`Ctr::cmp_rate`] to compare rates.
///
/// # Examples
///
/// ```
/// # use linkedin_ads_report::Ctr;
/// assert_eq!(Ctr::new(10, 100).value(), Some(0.1));
/// assert_eq!(Ctr::new(10, 100).to_string(), "10.00%");
/// assert_eq!(Ctr::new(3, 0).value(), None);
/// assert_eq!(Ctr::new(3, 0).to_string(), "N/A");
/// ```
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct Ctr {
    clicks: u64,
    impressions: u64,
}

impl Ctr {
    #[must_use]
    pub fn new(clicks: u64, impressions: u64) -> Self {
        Self {
            clicks,
            impressions,
        }
    }

    /// Returns clicks divided by impressions, or `None` if there were no
    /// impressions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> Option<f64> {
        if self.impressions == 0 {
            None
        } else {
            Some(self.clicks as f64 / self.impressions as f64)
        }
    }

    /// Orders rates ascending, with undefined rates below every defined one.
    #[must_use]
    pub fn cmp_rate(&self, other: &Self) -> Ordering {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}

impl Debug for Ctr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Ctr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value() {
            Some(rate) => f.pad(&format!("{:.2}%", rate * 100.0)),
            None => f.pad("N/A"),
        }
    }
}

impl AddAssign for Ctr {
    fn add_assign(&mut self, rhs: Self) {
        self.clicks += rhs.clicks;
        self.impressions += rhs.impressions;
    }
}
