//! Per-user sync session: local snapshot first, remote merge second,
//! optimistic edits with write-behind.
//!
//! Phases: `Idle` before any user is chosen, `LocalLoaded` once the cached
//! snapshot is applied, `Merged` once the remote record has been merged over it.
//! Every user switch bumps a generation counter and a fetch that completes
//! under an older generation is discarded.
//!
//! Remote writes are queued per (user, date). Each queue keeps only the newest
//! list and a gate that lets one push for that day run at a time, so a retried
//! older list can never land after a newer one.

use super::cache::LocalCache;
use super::remote::RemoteRecords;
use super::retry::RetryPolicy;
use crate::adherence::is_future;
use crate::calendar::toggled;
use crate::core::{Clock, Result, TrackerError, UserRecord, date_key, record_key};
use crate::plan::PlanResolver;
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    LocalLoaded,
    Merged,
}

/// Observable state of the write-behind queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing { pending: usize },
    /// Writes that exhausted their retries, as (user, date) pairs.
    Failed {
        dirty: Vec<(String, String)>,
        last_error: String,
    },
}

type DayRef = (String, String);

/// Writes queued for one day.
#[derive(Default)]
struct DayQueue {
    /// Spawned push tasks that have not finished yet.
    queued: usize,
    /// Newest list not yet taken by a push task.
    latest: Option<Vec<String>>,
    gate: Arc<AsyncMutex<()>>,
}

struct SessionState {
    user: Option<String>,
    generation: u64,
    phase: SessionPhase,
    record: UserRecord,
    in_flight: BTreeMap<DayRef, DayQueue>,
    dirty: BTreeSet<DayRef>,
    last_error: Option<String>,
}

impl SessionState {
    fn status(&self) -> SyncStatus {
        let pending: usize = self.in_flight.values().map(|q| q.queued).sum();
        if pending > 0 {
            return SyncStatus::Syncing { pending };
        }
        if self.dirty.is_empty() {
            return SyncStatus::Idle;
        }
        SyncStatus::Failed {
            dirty: self.dirty.iter().cloned().collect(),
            last_error: self.last_error.clone().unwrap_or_default(),
        }
    }

    /// True if a local value for this day must not be overwritten by a fetch.
    fn is_unsynced(&self, day: &DayRef) -> bool {
        self.in_flight.contains_key(day) || self.dirty.contains(day)
    }

    /// Replaces the day's pending list and counts one more push task for it.
    fn enqueue(&mut self, day: DayRef, supplements: Vec<String>) -> Arc<AsyncMutex<()>> {
        let queue = self.in_flight.entry(day).or_default();
        queue.queued += 1;
        queue.latest = Some(supplements);
        Arc::clone(&queue.gate)
    }
}

struct Shared {
    state: Mutex<SessionState>,
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteRecords>,
    resolver: PlanResolver,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    status_tx: watch::Sender<SyncStatus>,
}

impl Shared {
    fn publish(&self, state: &SessionState) {
        self.status_tx.send_replace(state.status());
    }

    fn persist_local(&self, user: &str, record: &UserRecord) {
        if let Err(err) = self.cache.store(&record_key(user), &record.to_json()) {
            warn!(user, error = %err, "failed to write local cache");
        }
    }

    fn load_local(&self, user: &str) -> Option<UserRecord> {
        match self.cache.load(&record_key(user)) {
            Ok(Some(raw)) => match UserRecord::from_json(raw, user) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(user, error = %err, "ignoring unreadable local cache");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(user, error = %err, "failed to read local cache");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct SyncSession {
    shared: Arc<Shared>,
}

impl SyncSession {
    pub fn new(
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteRecords>,
        resolver: PlanResolver,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        let state = SessionState {
            user: None,
            generation: 0,
            phase: SessionPhase::Idle,
            record: UserRecord::new(),
            in_flight: BTreeMap::new(),
            dirty: BTreeSet::new(),
            last_error: None,
        };
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                cache,
                remote,
                resolver,
                clock,
                retry,
                status_tx,
            }),
        }
    }

    pub fn resolver(&self) -> &PlanResolver {
        &self.shared.resolver
    }

    pub fn today(&self) -> NaiveDate {
        self.shared.clock.today()
    }

    pub fn user(&self) -> Result<Option<String>> {
        Ok(self.shared.state.lock()?.user.clone())
    }

    pub fn phase(&self) -> Result<SessionPhase> {
        Ok(self.shared.state.lock()?.phase)
    }

    /// Snapshot of the in-memory record for the selected user.
    pub fn record(&self) -> Result<UserRecord> {
        Ok(self.shared.state.lock()?.record.clone())
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Switches to `user`: applies the cached snapshot immediately and starts
    /// the remote fetch. Await the handle to know when the merge has landed.
    pub fn select_user(&self, user: &str) -> Result<JoinHandle<()>> {
        if user.is_empty() {
            return Err(TrackerError::validation("user is required"));
        }

        let local = self.shared.load_local(user);
        let generation = {
            let mut state = self.shared.state.lock()?;
            state.generation += 1;
            state.user = Some(user.to_string());
            state.record = local.unwrap_or_default();
            state.phase = SessionPhase::LocalLoaded;
            state.generation
        };
        debug!(user, generation, "selected user");

        let shared = Arc::clone(&self.shared);
        let user = user.to_string();
        Ok(tokio::spawn(async move {
            let fetched = shared.remote.fetch(&user).await;
            merge_fetched(&shared, &user, generation, fetched);
        }))
    }

    /// Flips one supplement for `date`. Only planned supplements on non-future
    /// days can be toggled. Returns the new list and the handle of its remote write.
    pub fn toggle(
        &self,
        date: NaiveDate,
        supplement: &str,
    ) -> Result<(Vec<String>, JoinHandle<()>)> {
        let user = self.require_user()?;
        self.ensure_editable(date)?;
        if !self.shared.resolver.is_planned(date, &user, supplement) {
            return Err(TrackerError::validation(format!(
                "'{supplement}' is not scheduled for {}",
                date_key(date)
            )));
        }

        let supplement = supplement.to_string();
        self.apply(&user, date_key(date), move |current| toggled(current, &supplement))
    }

    /// Saves the full list for `date` as chosen in the edit dialog.
    pub fn save_day(&self, date: NaiveDate, supplements: Vec<String>) -> Result<JoinHandle<()>> {
        let user = self.require_user()?;
        self.ensure_editable(date)?;
        let (_, handle) = self.apply(&user, date_key(date), move |_| supplements)?;
        Ok(handle)
    }

    /// Re-sends every day whose write previously failed. Returns how many succeeded.
    pub async fn flush_dirty(&self) -> Result<usize> {
        let (dirty, current_user) = {
            let state = self.shared.state.lock()?;
            (
                state.dirty.iter().cloned().collect::<Vec<_>>(),
                state.user.clone(),
            )
        };
        if dirty.is_empty() {
            return Ok(0);
        }
        info!(count = dirty.len(), "re-sending unsynced days");

        let mut handles = Vec::with_capacity(dirty.len());
        for day in &dirty {
            let cached = if current_user.as_deref() == Some(day.0.as_str()) {
                None
            } else {
                Some(
                    self.shared
                        .load_local(&day.0)
                        .map(|r| r.taken(&day.1).to_vec())
                        .unwrap_or_default(),
                )
            };
            let gate = {
                let mut state = self.shared.state.lock()?;
                let list = match cached {
                    Some(list) => list,
                    None => state.record.taken(&day.1).to_vec(),
                };
                let gate = state.enqueue(day.clone(), list);
                self.shared.publish(&state);
                gate
            };
            handles.push(self.spawn_push(day.clone(), gate));
        }
        join_all(handles).await;

        let state = self.shared.state.lock()?;
        Ok(dirty.iter().filter(|day| !state.dirty.contains(*day)).count())
    }

    /// Resolves once no write is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        let _ = rx
            .wait_for(|status| !matches!(status, SyncStatus::Syncing { .. }))
            .await;
    }

    fn require_user(&self) -> Result<String> {
        self.user()?
            .ok_or_else(|| TrackerError::validation("no user selected"))
    }

    fn ensure_editable(&self, date: NaiveDate) -> Result<()> {
        if is_future(date, self.today()) {
            return Err(TrackerError::validation(format!(
                "{} is in the future",
                date_key(date)
            )));
        }
        Ok(())
    }

    /// Optimistic local apply, synchronous cache write, then the remote write.
    ///
    /// `update` maps the current list to the new one. Reading, updating and
    /// queueing happen under one lock so concurrent edits of a day compose.
    fn apply<F>(&self, user: &str, date: String, update: F) -> Result<(Vec<String>, JoinHandle<()>)>
    where
        F: FnOnce(&[String]) -> Vec<String>,
    {
        let day = (user.to_string(), date);
        let (updated, gate) = {
            let mut state = self.shared.state.lock()?;
            let updated = update(state.record.taken(&day.1));
            state.record.set_day(day.1.clone(), updated.clone());
            self.shared.persist_local(user, &state.record);
            let gate = state.enqueue(day.clone(), updated.clone());
            self.shared.publish(&state);
            (updated, gate)
        };
        Ok((updated, self.spawn_push(day, gate)))
    }

    /// Waits for the day's gate, then pushes whatever list is newest at that point.
    /// Finds nothing to do if an earlier task already took the newest list.
    fn spawn_push(&self, day: DayRef, gate: Arc<AsyncMutex<()>>) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let _turn = gate.lock().await;
            let Some(supplements) = take_latest(&shared, &day) else {
                finish_write(&shared, day, None);
                return;
            };
            let (user, date) = &day;
            let result = shared
                .retry
                .run("set_day", || shared.remote.push(user, date, &supplements))
                .await;
            finish_write(&shared, day, Some(result));
        })
    }
}

fn take_latest(shared: &Shared, day: &DayRef) -> Option<Vec<String>> {
    let mut state = shared.state.lock().ok()?;
    state.in_flight.get_mut(day)?.latest.take()
}

fn merge_fetched(shared: &Shared, user: &str, generation: u64, fetched: Result<UserRecord>) {
    let Ok(mut state) = shared.state.lock() else {
        warn!(user, "session state poisoned, dropping fetch result");
        return;
    };
    if state.generation != generation {
        debug!(user, generation, current = state.generation, "discarding stale fetch");
        return;
    }

    let mut incoming = match fetched {
        Ok(remote) => remote,
        Err(err) => {
            warn!(user, error = %err, "remote fetch failed, keeping local snapshot");
            return;
        }
    };

    let local_wins =
        incoming.retain_dates(|date| !state.is_unsynced(&(user.to_string(), date.to_string())));
    state.record.merge_over(incoming);
    state.phase = SessionPhase::Merged;
    shared.persist_local(user, &state.record);
    debug!(user, days = state.record.len(), local_wins, "merged remote record");
}

/// `None` means the task was superseded and pushed nothing.
fn finish_write(shared: &Shared, day: DayRef, outcome: Option<Result<()>>) {
    let Ok(mut state) = shared.state.lock() else {
        warn!(user = %day.0, date = %day.1, "session state poisoned, dropping write result");
        return;
    };
    if let Some(queue) = state.in_flight.get_mut(&day) {
        queue.queued = queue.queued.saturating_sub(1);
        if queue.queued == 0 {
            state.in_flight.remove(&day);
        }
    }
    match outcome {
        None => debug!(user = %day.0, date = %day.1, "newer list already pushed"),
        Some(Ok(())) => {
            debug!(user = %day.0, date = %day.1, "day synced");
            state.dirty.remove(&day);
        }
        Some(Err(err)) => {
            warn!(user = %day.0, date = %day.1, error = %err, "day left unsynced");
            state.last_error = Some(err.to_string());
            state.dirty.insert(day);
        }
    }
    shared.publish(&state);
}
