//! Calendar views over a user record: heatmap cells, month navigation,
//! the per-day checklist and the edit dialog seed.

use crate::adherence::{DayState, Filter, classify, is_future};
use crate::core::{UserRecord, date_key};
use crate::plan::PlanResolver;
use crate::retention::{MonthRef, allowed_months};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const CLASS_FUTURE: &str = "future-cell";
pub const CLASS_SELECTED: &str = "selected-cell";

/// (fill color, caption) for each heatmap intensity.
pub const LEGEND: [(&str, &str); 4] = [
    ("#ebedf0", "No supplements taken"),
    ("#9be9a8", "Some supplements taken"),
    ("#40c463", "All planned supplements taken"),
    ("#dbe4ee", "Future date"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub date: String,
    pub state: DayState,
    pub count: u8,
    pub selected: bool,
}

impl HeatmapCell {
    pub fn css_class(&self) -> &'static str {
        if self.state == DayState::Future {
            return CLASS_FUTURE;
        }
        if self.selected {
            return CLASS_SELECTED;
        }
        match self.count {
            0 => "color-github-0",
            1 => "color-github-1",
            _ => "color-github-2",
        }
    }
}

/// What the heatmap needs to know about whose calendar it is drawing.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub record: &'a UserRecord,
    pub resolver: &'a PlanResolver,
    pub user: &'a str,
    pub filter: &'a Filter,
    pub today: NaiveDate,
}

impl ViewContext<'_> {
    pub fn state_of(&self, date: NaiveDate) -> DayState {
        let key = date_key(date);
        let planned = self.resolver.planned(date, self.user);
        classify(
            date,
            self.record.taken(&key),
            &planned,
            self.filter,
            self.today,
        )
    }
}

/// One cell per calendar day of `month`, first to last.
pub fn month_cells(
    month: MonthRef,
    ctx: &ViewContext<'_>,
    selected: Option<NaiveDate>,
) -> Vec<HeatmapCell> {
    let (Some(first), Some(last)) = (month.first_day(), month.last_day()) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| {
            let state = ctx.state_of(date);
            HeatmapCell {
                date: date_key(date),
                state,
                count: state.count(),
                selected: selected == Some(date),
            }
        })
        .collect()
}

/// Plain-text month grid, Monday-first, one glyph per day.
pub fn render_month(month: MonthRef, cells: &[HeatmapCell]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", month.key()));
    out.push_str(" Mo Tu We Th Fr Sa Su\n");

    let offset = month
        .first_day()
        .map(|d| d.weekday().num_days_from_monday() as usize)
        .unwrap_or(0);
    for _ in 0..offset {
        out.push_str("   ");
    }

    for (i, cell) in cells.iter().enumerate() {
        let glyph = match (cell.selected, cell.state) {
            (true, _) => '*',
            (_, DayState::Future) => '.',
            (_, DayState::None) => '-',
            (_, DayState::Partial) => '+',
            (_, DayState::Full) => '#',
        };
        out.push_str(&format!("  {glyph}"));
        if (offset + i + 1) % 7 == 0 {
            out.push('\n');
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Month cursor clamped to the retention window of `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthNavigator {
    current: MonthRef,
    min: MonthRef,
    max: MonthRef,
}

impl MonthNavigator {
    pub fn new(today: NaiveDate) -> Self {
        let window = allowed_months(today);
        Self {
            current: window.newest(),
            min: window.oldest(),
            max: window.newest(),
        }
    }

    pub fn current(&self) -> MonthRef {
        self.current
    }

    pub fn can_previous(&self) -> bool {
        self.current > self.min
    }

    pub fn can_next(&self) -> bool {
        self.current < self.max
    }

    pub fn previous(&mut self) -> MonthRef {
        if self.can_previous() {
            self.current = self.current.shift(-1);
        }
        self.current
    }

    pub fn next(&mut self) -> MonthRef {
        if self.can_next() {
            self.current = self.current.shift(1);
        }
        self.current
    }

    /// Jumps to `month` if it is inside the window; returns whether it moved.
    pub fn seek(&mut self, month: MonthRef) -> bool {
        if month < self.min || month > self.max {
            return false;
        }
        self.current = month;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub supplement: String,
    pub planned: bool,
    pub checked: bool,
}

impl ChecklistItem {
    pub fn label(&self) -> String {
        if self.planned {
            self.supplement.clone()
        } else {
            format!("{} (not scheduled)", self.supplement)
        }
    }
}

/// Every catalog supplement for `date`, flagged with whether it is planned and taken.
pub fn checklist(
    date: NaiveDate,
    record: &UserRecord,
    resolver: &PlanResolver,
    user: &str,
) -> Vec<ChecklistItem> {
    let planned = resolver.planned(date, user);
    let taken = record.taken(&date_key(date));
    resolver
        .catalog()
        .into_iter()
        .map(|supplement| ChecklistItem {
            planned: planned.contains(&supplement),
            checked: taken.contains(&supplement),
            supplement,
        })
        .collect()
}

/// Initial selection for the edit dialog: what is stored, else the plan.
/// Future days cannot be opened.
pub fn edit_seed(
    date: NaiveDate,
    record: &UserRecord,
    resolver: &PlanResolver,
    user: &str,
    today: NaiveDate,
) -> Option<Vec<String>> {
    if is_future(date, today) {
        return None;
    }
    Some(
        record
            .get(&date_key(date))
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| resolver.planned(date, user)),
    )
}

/// Toggle rule: drop every occurrence if present, otherwise append.
pub fn toggled(current: &[String], supplement: &str) -> Vec<String> {
    if current.iter().any(|s| s == supplement) {
        current
            .iter()
            .filter(|s| s.as_str() != supplement)
            .cloned()
            .collect()
    } else {
        let mut next = current.to_vec();
        next.push(supplement.to_string());
        next
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
    fn month_cells_cover_every_day_and_classify() {
        let resolver = PlanResolver::default();
        let mut record = UserRecord::new();
        // Monday, full weekday plan for Gayatri
        record.set_day(
            "2025-06-02",
            names(&["Calcium D3 + K2", "Omega-3", "UC-II Collagen"]),
        );
        record.set_day("2025-06-03", names(&["Omega-3"]));
        let filter = Filter::All;
        let ctx = ViewContext {
            record: &record,
            resolver: &resolver,
            user: "Gayatri",
            filter: &filter,
            today: day(2025, 6, 10),
        };

        let cells = month_cells(MonthRef { year: 2025, month: 6 }, &ctx, Some(day(2025, 6, 4)));

        assert_eq!(cells.len(), 30);
        assert_eq!(cells[0].date, "2025-06-01");
        assert_eq!(cells[1].state, DayState::Full);
        assert_eq!(cells[1].css_class(), "color-github-2");
        assert_eq!(cells[2].state, DayState::Partial);
        assert_eq!(cells[3].css_class(), CLASS_SELECTED);
        assert_eq!(cells[4].state, DayState::None);
        assert_eq!(cells[10].state, DayState::Future);
        assert_eq!(cells[10].css_class(), CLASS_FUTURE);
    }

    #[test]
    fn render_month_starts_on_the_right_weekday() {
        let month = MonthRef { year: 2025, month: 6 };
        let cells: Vec<HeatmapCell> = (1..=30)
            .map(|d| HeatmapCell {
                date: format!("2025-06-{d:02}"),
                state: DayState::None,
                count: 0,
                selected: false,
            })
            .collect();
        let text = render_month(month, &cells);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2025-06");
        // June 1st 2025 is a Sunday: six blank slots then one glyph.
        assert_eq!(lines[2], format!("{}  -", " ".repeat(18)));
    }

    #[test]
    fn navigator_is_bounded_by_retention_window() {
        let mut nav = MonthNavigator::new(day(2025, 2, 10));
        assert!(!nav.can_next());
        assert_eq!(nav.previous().key(), "2025-01");
        assert_eq!(nav.previous().key(), "2024-12");
        assert!(!nav.can_previous());
        assert_eq!(nav.previous().key(), "2024-12");
        assert_eq!(nav.next().key(), "2025-01");
        assert!(!nav.seek(MonthRef { year: 2024, month: 11 }));
    }

    #[test]
    fn checklist_flags_unscheduled_items() {
        let resolver = PlanResolver::default();
        let mut record = UserRecord::new();
        record.set_day("2025-06-14", names(&["Magnesium Glycinate"]));

        let items = checklist(day(2025, 6, 14), &record, &resolver, "Dinesh");

        assert_eq!(items.len(), 4);
        assert!(!items[0].planned);
        assert_eq!(items[0].label(), "Calcium D3 + K2 (not scheduled)");
        assert!(items[3].planned && items[3].checked);
    }

    #[test]
    fn edit_seed_prefers_stored_list() {
        let resolver = PlanResolver::default();
        let today = day(2025, 6, 20);
        let mut record = UserRecord::new();
        record.set_day("2025-06-16", names(&["Omega-3"]));

        assert_eq!(
            edit_seed(day(2025, 6, 16), &record, &resolver, "Gayatri", today),
            Some(names(&["Omega-3"]))
        );
        assert_eq!(
            edit_seed(day(2025, 6, 17), &record, &resolver, "Gayatri", today),
            Some(names(&["Calcium D3 + K2", "Omega-3", "UC-II Collagen"]))
        );
        assert_eq!(
            edit_seed(day(2025, 6, 21), &record, &resolver, "Gayatri", today),
            None
        );
    }

    #[test]
    fn toggle_appends_or_removes_all_copies() {
        assert_eq!(toggled(&names(&["A"]), "B"), names(&["A", "B"]));
        assert_eq!(toggled(&names(&["B", "A", "B"]), "B"), names(&["A"]));
        assert_eq!(toggled(&[], "A"), names(&["A"]));
    }
}
