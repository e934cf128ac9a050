//! Classifies a day as none/partial/full/future for calendar rendering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    Future,
    None,
    Partial,
    Full,
}

impl DayState {
    /// Heatmap intensity: 0 none, 1 partial, 2 full. Future days carry no intensity.
    pub fn count(self) -> u8 {
        match self {
            DayState::Future | DayState::None => 0,
            DayState::Partial => 1,
            DayState::Full => 2,
        }
    }

    pub fn is_editable(self) -> bool {
        self != DayState::Future
    }
}

/// Which supplements count toward a day's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    pub const ALL_LABEL: &'static str = "All";

    pub fn only(name: impl Into<String>) -> Self {
        Filter::Only(name.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Filter::All => Self::ALL_LABEL,
            Filter::Only(name) => name,
        }
    }

    /// Number of taken entries this filter keeps.
    fn relevant(&self, taken: &[String]) -> usize {
        match self {
            Filter::All => taken.len(),
            Filter::Only(name) => usize::from(taken.iter().any(|s| s == name)),
        }
    }
}

impl FromStr for Filter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == Self::ALL_LABEL {
            Ok(Filter::All)
        } else {
            Ok(Filter::Only(trimmed.to_string()))
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Strictly after `today`; the same calendar day is not future.
pub fn is_future(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// Classifies one day.
///
/// `planned` is always the unfiltered plan for the date, so an empty plan with nothing
/// taken reads as `None` and a single-supplement filter cannot vacuously report `Full`.
pub fn classify(
    date: NaiveDate,
    taken: &[String],
    planned: &[String],
    filter: &Filter,
    today: NaiveDate,
) -> DayState {
    if is_future(date, today) {
        return DayState::Future;
    }

    let relevant = filter.relevant(taken);
    if relevant == 0 {
        DayState::None
    } else if relevant == planned.len() {
        DayState::Full
    } else {
        DayState::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn future_wins_over_everything() {
        let today = day(2025, 6, 15);
        let planned = names(&["A"]);
        let taken = names(&["A"]);
        assert_eq!(
            classify(day(2025, 6, 16), &taken, &planned, &Filter::All, today),
            DayState::Future
        );
        assert_eq!(
            classify(day(2025, 6, 15), &taken, &planned, &Filter::All, today),
            DayState::Full
        );
    }

    #[test]
    fn empty_plan_and_nothing_taken_is_none() {
        let today = day(2025, 6, 15);
        assert_eq!(
            classify(day(2025, 6, 14), &[], &[], &Filter::All, today),
            DayState::None
        );
    }

    #[test]
    fn all_filter_counts_every_taken_entry() {
        let today = day(2025, 6, 30);
        let planned = names(&["A", "B", "C"]);
        assert_eq!(
            classify(day(2025, 6, 2), &names(&["A"]), &planned, &Filter::All, today),
            DayState::Partial
        );
        assert_eq!(
            classify(
                day(2025, 6, 2),
                &names(&["C", "A", "B"]),
                &planned,
                &Filter::All,
                today
            ),
            DayState::Full
        );
    }

    #[test]
    fn single_filter_is_partial_against_a_longer_plan() {
        let today = day(2025, 6, 30);
        let planned = names(&["A", "B"]);
        let filter = Filter::only("A");
        assert_eq!(
            classify(day(2025, 6, 2), &names(&["A", "B"]), &planned, &filter, today),
            DayState::Partial
        );
        assert_eq!(
            classify(day(2025, 6, 2), &names(&["B"]), &planned, &filter, today),
            DayState::None
        );
    }

    #[test]
    fn single_filter_is_full_when_plan_has_one_entry() {
        let today = day(2025, 6, 30);
        let planned = names(&["M"]);
        assert_eq!(
            classify(
                day(2025, 6, 1),
                &names(&["M"]),
                &planned,
                &Filter::only("M"),
                today
            ),
            DayState::Full
        );
    }

    #[test]
    fn filter_parses_all_label() {
        assert_eq!("All".parse::<Filter>().unwrap(), Filter::All);
        assert_eq!(" ".parse::<Filter>().unwrap(), Filter::All);
        assert_eq!("Omega-3".parse::<Filter>().unwrap(), Filter::only("Omega-3"));
        assert_eq!(Filter::only("Omega-3").to_string(), "Omega-3");
    }
}
