//! In-process remote record store
//!
//! [`InMemoryRemoteStore`] implements [`IRemoteStore`] with the same
//! observable semantics as the HTTP service: per-zone change logs with
//! strictly increasing sequence numbers, server-assigned record versions,
//! version-checked saves, a paginated change feed and idempotent zone
//! creation reported as [`RemoteError::AlreadyExists`].
//!
//! It also supports failure injection, per-operation latency and a call
//! journal, which makes it the backend for engine tests and for hosts that
//! want to run offline.
//!
//! ## Change tokens
//!
//! Tokens have the form `g{generation}-s{sequence}`. A token positions the
//! feed after the given sequence number. Generations are unique across the
//! whole store: every zone creation and every token expiry draws a new one,
//! so tokens from an expired or deleted zone are rejected with
//! [`RemoteError::ChangeTokenExpired`] even after the zone is recreated.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use zonesync_core::domain::newtypes::{
    ChangeToken, RecordId, RecordVersion, RemoteIdentity, SubscriptionId, ZoneId,
};
use zonesync_core::domain::record::Record;
use zonesync_core::ports::{
    ChangePage, IRemoteStore, RecordFailure, RecordFailureKind, RecordOperation, RecordOutcome,
    RemoteError, SavePolicy, ZoneSubscription,
};

/// The remote operations the store journals and can fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    FetchIdentity,
    SaveZone,
    SaveSubscription,
    FetchChanges,
    ModifyRecords,
}

/// Journal entry phase: when an operation was dispatched and when it returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Finished,
}

#[derive(Debug)]
struct PlannedFailure {
    operation: RemoteOperation,
    /// Matching calls to let through before failing
    skip: usize,
    error: RemoteError,
}

#[derive(Debug, Clone)]
enum ChangeKind {
    Saved,
    Deleted,
}

#[derive(Debug, Clone)]
struct ChangeEntry {
    sequence: u64,
    record_id: RecordId,
    kind: ChangeKind,
}

#[derive(Debug, Default)]
struct ZoneState {
    records: BTreeMap<RecordId, Record>,
    log: Vec<ChangeEntry>,
    /// Latest log sequence per record; older entries for the record are superseded
    latest: HashMap<RecordId, u64>,
    head: u64,
    generation: u64,
}

impl ZoneState {
    fn append(&mut self, record_id: RecordId, kind: ChangeKind) {
        self.head += 1;
        self.latest.insert(record_id.clone(), self.head);
        self.log.push(ChangeEntry {
            sequence: self.head,
            record_id,
            kind,
        });
    }

    fn token(&self, sequence: u64) -> Result<ChangeToken, RemoteError> {
        ChangeToken::new(format!("g{}-s{}", self.generation, sequence))
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    /// Sequence a token points after, if it belongs to the current generation
    fn position(&self, token: &ChangeToken) -> Result<u64, RemoteError> {
        let (generation, sequence) = token
            .as_str()
            .strip_prefix('g')
            .and_then(|rest| rest.split_once("-s"))
            .and_then(|(g, s)| Some((g.parse::<u64>().ok()?, s.parse::<u64>().ok()?)))
            .ok_or(RemoteError::ChangeTokenExpired)?;

        if generation != self.generation || sequence > self.head {
            return Err(RemoteError::ChangeTokenExpired);
        }
        Ok(sequence)
    }
}

#[derive(Debug, Default)]
struct State {
    zones: HashMap<ZoneId, ZoneState>,
    subscriptions: HashMap<SubscriptionId, ZoneSubscription>,
    failures: Vec<PlannedFailure>,
    latency: HashMap<RemoteOperation, Duration>,
    calls: HashMap<RemoteOperation, usize>,
    journal: Vec<(RemoteOperation, Phase)>,
    version_counter: u64,
    generation_counter: u64,
}

impl State {
    fn next_generation(&mut self) -> u64 {
        self.generation_counter += 1;
        self.generation_counter
    }
}

// ============================================================================
// InMemoryRemoteStore
// ============================================================================

/// A complete remote record store living in process memory
#[derive(Debug)]
pub struct InMemoryRemoteStore {
    identity: RemoteIdentity,
    state: Mutex<State>,
}

impl InMemoryRemoteStore {
    /// Creates an empty store whose signed-in account is `identity`
    pub fn new(identity: RemoteIdentity) -> Self {
        Self {
            identity,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Test and host controls
    // ------------------------------------------------------------------------

    /// Fails the next call of `operation` with `error`
    pub fn fail_next(&self, operation: RemoteOperation, error: RemoteError) {
        self.fail_after(operation, 0, error);
    }

    /// Lets `skip` calls of `operation` through, then fails the following one
    pub fn fail_after(&self, operation: RemoteOperation, skip: usize, error: RemoteError) {
        self.lock().failures.push(PlannedFailure {
            operation,
            skip,
            error,
        });
    }

    /// Delays every call of `operation` by `delay` before it takes effect
    pub fn set_latency(&self, operation: RemoteOperation, delay: Duration) {
        self.lock().latency.insert(operation, delay);
    }

    /// Number of calls made to `operation`, including failed ones
    pub fn call_count(&self, operation: RemoteOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Every call start and finish, in the order they happened
    pub fn journal(&self) -> Vec<(RemoteOperation, Phase)> {
        self.lock().journal.clone()
    }

    pub fn zone_exists(&self, zone_id: &ZoneId) -> bool {
        self.lock().zones.contains_key(zone_id)
    }

    pub fn subscription(&self, id: &SubscriptionId) -> Option<ZoneSubscription> {
        self.lock().subscriptions.get(id).cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Current stored copy of a record
    pub fn record(&self, zone_id: &ZoneId, record_id: &RecordId) -> Option<Record> {
        self.lock()
            .zones
            .get(zone_id)
            .and_then(|zone| zone.records.get(record_id).cloned())
    }

    /// Writes a record the way another device would, bypassing version checks
    pub fn write_from_other_device(
        &self,
        zone_id: &ZoneId,
        record: Record,
    ) -> Result<Record, RemoteError> {
        let mut state = self.lock();
        let State {
            zones,
            version_counter,
            ..
        } = &mut *state;
        let zone = zones
            .get_mut(zone_id)
            .ok_or_else(|| RemoteError::ZoneNotFound(zone_id.to_string()))?;
        Ok(store_record(zone, version_counter, record))
    }

    /// Invalidates every change token issued so far for the zone
    pub fn expire_change_tokens(&self, zone_id: &ZoneId) {
        let mut state = self.lock();
        let generation = state.next_generation();
        if let Some(zone) = state.zones.get_mut(zone_id) {
            zone.generation = generation;
        }
    }

    /// Deletes the zone with all its records, as a reset from another device would
    pub fn delete_zone(&self, zone_id: &ZoneId) {
        let mut state = self.lock();
        state.zones.remove(zone_id);
        state.subscriptions.retain(|_, s| &s.zone_id != zone_id);
    }

    // ------------------------------------------------------------------------
    // Call bookkeeping
    // ------------------------------------------------------------------------

    /// Journals the start of a call, applies latency and planned failures
    async fn begin(&self, operation: RemoteOperation) -> Result<(), RemoteError> {
        let delay = {
            let mut state = self.lock();
            *state.calls.entry(operation).or_insert(0) += 1;
            state.journal.push((operation, Phase::Started));
            state.latency.get(&operation).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if let Some(index) = state
            .failures
            .iter()
            .position(|f| f.operation == operation)
        {
            if state.failures[index].skip == 0 {
                let failure = state.failures.remove(index);
                state.journal.push((operation, Phase::Finished));
                debug!(?operation, error = %failure.error, "Injected remote failure");
                return Err(failure.error);
            }
            state.failures[index].skip -= 1;
        }
        Ok(())
    }

    fn finish(&self, operation: RemoteOperation) {
        self.lock().journal.push((operation, Phase::Finished));
    }
}

/// Stores a record with a fresh server version and logs the change
fn store_record(zone: &mut ZoneState, version_counter: &mut u64, record: Record) -> Record {
    *version_counter += 1;
    let mut stored = record.with_modified_at(Utc::now());
    if let Ok(version) = RecordVersion::new(format!("v{version_counter}")) {
        stored.set_version(version);
    }
    zone.records.insert(stored.id().clone(), stored.clone());
    zone.append(stored.id().clone(), ChangeKind::Saved);
    stored
}

fn apply_operation(
    zone: &mut ZoneState,
    version_counter: &mut u64,
    operation: &RecordOperation,
) -> RecordOutcome {
    match operation {
        RecordOperation::Save { record, policy } => {
            let stored = zone.records.get(record.id());
            let failure = match (policy, stored) {
                (SavePolicy::Overwrite, _) => None,
                (SavePolicy::IfServerRecordUnchanged, Some(current))
                    if current.version() != record.version() =>
                {
                    Some(RecordFailureKind::Conflict)
                }
                (SavePolicy::IfServerRecordUnchanged, None) if !record.is_new() => {
                    Some(RecordFailureKind::NotFound)
                }
                _ => None,
            };

            match failure {
                Some(kind) => RecordOutcome::Failed(RecordFailure {
                    record_id: record.id().clone(),
                    kind,
                }),
                None => RecordOutcome::Saved(store_record(zone, version_counter, record.clone())),
            }
        }
        RecordOperation::Delete { record_id } => {
            if zone.records.remove(record_id).is_some() {
                zone.append(record_id.clone(), ChangeKind::Deleted);
                RecordOutcome::Deleted(record_id.clone())
            } else {
                RecordOutcome::Failed(RecordFailure {
                    record_id: record_id.clone(),
                    kind: RecordFailureKind::NotFound,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl IRemoteStore for InMemoryRemoteStore {
    async fn fetch_current_identity(&self) -> Result<RemoteIdentity, RemoteError> {
        self.begin(RemoteOperation::FetchIdentity).await?;
        self.finish(RemoteOperation::FetchIdentity);
        Ok(self.identity.clone())
    }

    async fn save_zone(&self, zone_id: &ZoneId) -> Result<(), RemoteError> {
        self.begin(RemoteOperation::SaveZone).await?;
        let result = {
            let mut state = self.lock();
            if state.zones.contains_key(zone_id) {
                Err(RemoteError::AlreadyExists(zone_id.to_string()))
            } else {
                let zone = ZoneState {
                    generation: state.next_generation(),
                    ..ZoneState::default()
                };
                state.zones.insert(zone_id.clone(), zone);
                Ok(())
            }
        };
        self.finish(RemoteOperation::SaveZone);
        result
    }

    async fn save_subscription(&self, subscription: &ZoneSubscription) -> Result<(), RemoteError> {
        self.begin(RemoteOperation::SaveSubscription).await?;
        let result = {
            let mut state = self.lock();
            if state.zones.contains_key(&subscription.zone_id) {
                state
                    .subscriptions
                    .insert(subscription.subscription_id.clone(), subscription.clone());
                Ok(())
            } else {
                Err(RemoteError::ZoneNotFound(subscription.zone_id.to_string()))
            }
        };
        self.finish(RemoteOperation::SaveSubscription);
        result
    }

    async fn fetch_zone_changes(
        &self,
        zone_id: &ZoneId,
        since: Option<&ChangeToken>,
        results_limit: u32,
    ) -> Result<ChangePage, RemoteError> {
        self.begin(RemoteOperation::FetchChanges).await?;
        let result = {
            let state = self.lock();
            match state.zones.get(zone_id) {
                None => Err(RemoteError::ZoneNotFound(zone_id.to_string())),
                Some(zone) => read_page(zone, since, results_limit),
            }
        };
        self.finish(RemoteOperation::FetchChanges);
        result
    }

    async fn modify_records(
        &self,
        zone_id: &ZoneId,
        operations: &[RecordOperation],
    ) -> Result<Vec<RecordOutcome>, RemoteError> {
        self.begin(RemoteOperation::ModifyRecords).await?;
        let result = {
            let mut state = self.lock();
            let State {
                zones,
                version_counter,
                ..
            } = &mut *state;
            match zones.get_mut(zone_id) {
                None => Err(RemoteError::ZoneNotFound(zone_id.to_string())),
                Some(zone) => Ok(operations
                    .iter()
                    .map(|op| apply_operation(zone, version_counter, op))
                    .collect()),
            }
        };
        self.finish(RemoteOperation::ModifyRecords);
        result
    }
}

/// Reads one page of the zone's change feed after `since`
///
/// Each record appears at most once, at the position of its latest change,
/// carrying its current state.
fn read_page(
    zone: &ZoneState,
    since: Option<&ChangeToken>,
    results_limit: u32,
) -> Result<ChangePage, RemoteError> {
    let start = match since {
        Some(token) => zone.position(token)?,
        None => 0,
    };
    let limit = results_limit.max(1) as usize;

    let mut pending: VecDeque<&ChangeEntry> = zone
        .log
        .iter()
        .filter(|entry| entry.sequence > start)
        .filter(|entry| zone.latest.get(&entry.record_id) == Some(&entry.sequence))
        .collect();

    let mut page = ChangePage::default();
    let mut last = start;
    while let Some(entry) = pending.pop_front() {
        match entry.kind {
            ChangeKind::Saved => {
                if let Some(record) = zone.records.get(&entry.record_id) {
                    page.changed.push(record.clone());
                }
            }
            ChangeKind::Deleted => page.deleted.push(entry.record_id.clone()),
        }
        last = entry.sequence;
        if page.changed.len() + page.deleted.len() >= limit {
            break;
        }
    }

    page.more_coming = !pending.is_empty();
    let position = if page.more_coming {
        last
    } else {
        zone.head.max(start)
    };
    page.change_token = Some(zone.token(position)?);
    Ok(page)
}
