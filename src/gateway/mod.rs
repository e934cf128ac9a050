//! Read/write contract against the backing store.
//!
//! Both directions recompute the retention window at call time. A write is an
//! unguarded read-modify-write of the user's whole record followed by a single
//! replace, so two concurrent writers for one user resolve as last-write-wins.

use crate::core::{Clock, Result, TrackerError, UserRecord, month_of, record_key};
use crate::retention::{RetentionWindow, allowed_months};
use crate::storage::KvStore;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct RecordGateway {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl RecordGateway {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn window(&self) -> RetentionWindow {
        allowed_months(self.clock.today())
    }

    async fn load(&self, user: &str) -> Result<UserRecord> {
        let raw = self.store.get(&record_key(user)).await?;
        UserRecord::from_json(raw.unwrap_or_default(), user)
    }

    /// The user's record restricted to the current retention window.
    ///
    /// A user with nothing stored gets an empty record.
    pub async fn get_visible(&self, user: &str) -> Result<UserRecord> {
        let user = require("user", user)?;
        let mut record = self.load(user).await?;
        let window = self.window();
        warn_malformed(user, &record);
        let hidden = window.prune(&mut record);
        debug!(user, visible = record.len(), hidden, "read visible record");
        Ok(record)
    }

    /// Replaces the list for `date`, prunes everything outside the window and
    /// writes the whole record back.
    ///
    /// A date outside the window is accepted and then pruned by the same call.
    /// Stored keys too short to carry a month are dropped here too, not carried over.
    pub async fn set_day(&self, user: &str, date: &str, supplements: Vec<String>) -> Result<()> {
        let user = require("user", user)?;
        let date = require("date", date)?;

        let mut record = self.load(user).await?;
        record.set_day(date, supplements);

        let window = self.window();
        warn_malformed(user, &record);
        let pruned = window.prune(&mut record);
        if !record.contains_date(date) {
            debug!(user, date, "written date lies outside the retention window");
        }

        self.store.set(&record_key(user), record.to_json()).await?;
        debug!(user, date, pruned, kept = record.len(), "stored day");
        Ok(())
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(TrackerError::validation(format!("{field} is required")));
    }
    Ok(value)
}

fn warn_malformed(user: &str, record: &UserRecord) {
    for date in record.dates().filter(|d| month_of(d).is_none()) {
        warn!(user, date, "dropping malformed date key");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::storage::InMemoryKvStore;
    use serde_json::json;

    fn gateway_on(store: Arc<InMemoryKvStore>, y: i32, m: u32, d: u32) -> RecordGateway {
        RecordGateway::new(store, Arc::new(FixedClock::ymd(y, m, d).unwrap()))
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_user_or_date_is_a_validation_error() {
        let gateway = gateway_on(Arc::new(InMemoryKvStore::new()), 2025, 6, 15);
        assert!(matches!(
            gateway.set_day("", "2025-06-15", vec![]).await,
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            gateway.set_day("A", "", vec![]).await,
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            gateway.get_visible("").await,
            Err(TrackerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn set_day_replaces_whole_list() {
        let store = Arc::new(InMemoryKvStore::new());
        let gateway = gateway_on(store.clone(), 2025, 6, 15);

        gateway
            .set_day("A", "2025-06-10", names(&["X", "Y"]))
            .await
            .unwrap();
        gateway
            .set_day("A", "2025-06-10", names(&["Z"]))
            .await
            .unwrap();

        assert_eq!(
            store.get("supp-A").await.unwrap(),
            Some(json!({"2025-06-10": ["Z"]}))
        );
    }

    #[tokio::test]
    async fn write_prunes_stale_and_malformed_entries() {
        let store = Arc::new(InMemoryKvStore::new());
        store
            .set(
                "supp-A",
                json!({"2025-01-05": ["Old"], "x": ["Bad"], "2025-05-01": ["Keep"]}),
            )
            .await
            .unwrap();
        let gateway = gateway_on(store.clone(), 2025, 6, 15);

        gateway
            .set_day("A", "2025-06-15", names(&["New"]))
            .await
            .unwrap();

        assert_eq!(
            store.get("supp-A").await.unwrap(),
            Some(json!({"2025-05-01": ["Keep"], "2025-06-15": ["New"]}))
        );
    }

    #[tokio::test]
    async fn non_object_record_is_a_storage_error() {
        let store = Arc::new(InMemoryKvStore::new());
        store.set("supp-A", json!("garbage")).await.unwrap();
        let gateway = gateway_on(store, 2025, 6, 15);

        assert!(matches!(
            gateway.get_visible("A").await,
            Err(TrackerError::Storage(_))
        ));
    }
}
