use serde::{Deserialize, Serialize};
use std::fmt;

const NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A month of the year, the time slice that selects which monthly flow
/// drives speed, width and color.
///
/// Always in `1..=12`.
///
/// # Examples
///
/// ```
/// use riverflow_types::month::Month;
///
/// let month = Month::new(12).unwrap();
/// assert_eq!(month.index(), 11);
/// assert!(Month::new(13).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    pub const JANUARY: Month = Month(1);

    /// Create a month from its 1-based number.
    pub fn new(number: u8) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self(number))
    }

    /// 1-based month number.
    pub fn number(&self) -> u8 {
        self.0
    }

    /// 0-based index into a twelve-entry table.
    pub fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }

    /// English month name.
    pub fn name(&self) -> &'static str {
        NAMES[self.index()]
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month)
    }
}

impl Default for Month {
    fn default() -> Self {
        Self::JANUARY
    }
}

impl TryFrom<u8> for Month {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Month::new(value).ok_or_else(|| format!("month must be between 1 and 12, got {}", value))
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
