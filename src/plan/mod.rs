//! Static supplement plan and the per-day resolver built on it.

use crate::core::{Result, TrackerError, parse_date_key};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Immutable plan configuration: who is tracked and what each day prescribes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementPlan {
    pub users: Vec<String>,
    /// Taken Monday through Friday, in this order.
    pub weekdays: Vec<String>,
    /// The one user who also takes `daily_extra` every day of the week.
    #[serde(default)]
    pub daily_extra_user: Option<String>,
    #[serde(default)]
    pub daily_extra: Vec<String>,
}

impl Default for SupplementPlan {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SupplementPlan {
    pub fn builtin() -> Self {
        Self {
            users: vec!["Gayatri".to_string(), "Dinesh".to_string()],
            weekdays: vec![
                "Calcium D3 + K2".to_string(),
                "Omega-3".to_string(),
                "UC-II Collagen".to_string(),
            ],
            daily_extra_user: Some("Dinesh".to_string()),
            daily_extra: vec!["Magnesium Glycinate".to_string()],
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let plan: Self = serde_json::from_str(raw)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::storage(format!("failed to read plan {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.users.is_empty() {
            return Err(TrackerError::validation("plan must name at least one user"));
        }
        if let Some(extra_user) = &self.daily_extra_user
            && !self.users.contains(extra_user)
        {
            return Err(TrackerError::validation(format!(
                "daily extra user '{extra_user}' is not a listed user"
            )));
        }
        Ok(())
    }

    pub fn knows_user(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }

    pub fn is_daily_extra_user(&self, user: &str) -> bool {
        self.daily_extra_user.as_deref() == Some(user)
    }

    /// Every supplement the plan mentions, weekday list first, without repeats.
    pub fn catalog(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for name in self.weekdays.iter().chain(self.daily_extra.iter()) {
            if !all.contains(name) {
                all.push(name.clone());
            }
        }
        all
    }
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Resolves the ordered supplements planned for a (date, user) pair.
///
/// The answer depends only on the weekday of the date and the user identity.
#[derive(Debug, Clone)]
pub struct PlanResolver {
    plan: Arc<SupplementPlan>,
}

impl PlanResolver {
    pub fn new(plan: SupplementPlan) -> Self {
        Self {
            plan: Arc::new(plan),
        }
    }

    pub fn from_shared(plan: Arc<SupplementPlan>) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &SupplementPlan {
        &self.plan
    }

    pub fn catalog(&self) -> Vec<String> {
        self.plan.catalog()
    }

    pub fn planned(&self, date: NaiveDate, user: &str) -> Vec<String> {
        let mut planned = Vec::new();
        if is_weekday(date) {
            planned.extend(self.plan.weekdays.iter().cloned());
        }
        if self.plan.is_daily_extra_user(user) {
            planned.extend(self.plan.daily_extra.iter().cloned());
        }
        planned
    }

    /// Same as [`planned`](Self::planned) for a `YYYY-MM-DD` key; `None` if the key does not parse.
    pub fn planned_for_key(&self, date_key: &str, user: &str) -> Option<Vec<String>> {
        parse_date_key(date_key).map(|date| self.planned(date, user))
    }

    pub fn is_planned(&self, date: NaiveDate, user: &str, supplement: &str) -> bool {
        self.planned(date, user).iter().any(|s| s == supplement)
    }
}

impl Default for PlanResolver {
    fn default() -> Self {
        Self::new(SupplementPlan::builtin())
    }
}
