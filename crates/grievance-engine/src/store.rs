//! Complaint store
//!
//! Append-only collection of complaint records keyed by id. Backed by
//! a sharded map: `get_mut` holds the entry's shard lock for the
//! duration of a mutation, which gives every mutation per-id mutual
//! exclusion without a store-wide lock. Reads clone fully-formed
//! records, so a complaint is only ever observed with all of its
//! initial fields set.
//!
//! Optionally snapshot-backed: `open` loads a JSON snapshot, `flush`
//! writes one. Records are never deleted by the lifecycle (archival
//! is a status transition), but `erase` exists as the explicit
//! erasure operation for data-removal requests.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use grievance_core::{Complaint, ComplaintStatus, ComplaintType, Error, Result, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Hard cap on page size, regardless of configuration.
pub const MAX_PAGE_SIZE: usize = 100;

const ID_RETRY_LIMIT: usize = 8;

/// Equality filters plus a closed timestamp interval.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Filters {
    pub agent_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ComplaintType>,
    pub severity: Option<Severity>,
    pub status: Option<ComplaintStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Filters {
    pub fn matches(&self, c: &Complaint) -> bool {
        if let Some(agent_id) = &self.agent_id {
            if &c.agent_id != agent_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if c.kind != kind {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if c.severity != severity {
                return false;
            }
        }
        if let Some(status) = self.status {
            if c.status != status {
                return false;
            }
        }
        if let Some(from) = self.from {
            if c.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if c.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Page/limit pagination, 1-based.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Timestamp descending, the default.
    #[default]
    NewestFirst,
    OldestFirst,
}

/// One page of query results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageResult {
    pub complaints: Vec<Complaint>,
    /// Total matches before pagination.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

pub struct ComplaintStore {
    complaints: DashMap<Uuid, Complaint>,
    /// Creation timestamps are monotonically non-decreasing within a
    /// process, even if the wall clock steps backwards.
    last_created: Mutex<DateTime<Utc>>,
    snapshot_path: Option<PathBuf>,
}

impl Default for ComplaintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplaintStore {
    /// In-memory store with no snapshot backing.
    pub fn new() -> Self {
        Self {
            complaints: DashMap::new(),
            last_created: Mutex::new(DateTime::<Utc>::MIN_UTC),
            snapshot_path: None,
        }
    }

    /// Open a snapshot-backed store. A missing file is an empty
    /// store; a malformed one is an error rather than silent loss.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            complaints: DashMap::new(),
            last_created: Mutex::new(DateTime::<Utc>::MIN_UTC),
            snapshot_path: Some(path.clone()),
        };
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let records: Vec<Complaint> = serde_json::from_str(&raw)?;
            let mut latest = DateTime::<Utc>::MIN_UTC;
            for c in records {
                latest = latest.max(c.timestamp);
                store.complaints.insert(c.id, c);
            }
            *store.last_created.lock().expect("store clock") = latest;
            info!(
                count = store.complaints.len(),
                path = %path.display(),
                "loaded complaint snapshot"
            );
        }
        Ok(store)
    }

    /// Write the snapshot, if this store is snapshot-backed.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let mut records = self.all();
        records.sort_by_key(|c| (c.timestamp, c.id));
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;
        debug!(count = records.len(), path = %path.display(), "flushed complaint snapshot");
        Ok(())
    }

    /// Create a complaint via `build`, which receives the generated
    /// id and creation timestamp. Id collisions are retried
    /// transparently; callers never see `DuplicateId`.
    pub fn create(&self, build: impl Fn(Uuid, DateTime<Utc>) -> Complaint) -> Result<Uuid> {
        self.create_with_ids(std::iter::repeat_with(Uuid::new_v4), build)
    }

    fn create_with_ids(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
        build: impl Fn(Uuid, DateTime<Utc>) -> Complaint,
    ) -> Result<Uuid> {
        let timestamp = self.next_timestamp();
        for id in ids.into_iter().take(ID_RETRY_LIMIT) {
            match self.try_insert(build(id, timestamp)) {
                Ok(id) => return Ok(id),
                Err(Error::DuplicateId(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        // v4 collisions this persistent mean a broken RNG.
        Err(Error::Internal("complaint id generation exhausted".into()))
    }

    /// Insert a fully-formed complaint, failing on id collision.
    fn try_insert(&self, complaint: Complaint) -> Result<Uuid> {
        let id = complaint.id;
        match self.complaints.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::DuplicateId(id)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(complaint);
                Ok(id)
            }
        }
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_created.lock().expect("store clock");
        let now = Utc::now();
        let ts = if now > *last { now } else { *last };
        *last = ts;
        ts
    }

    pub fn get(&self, id: Uuid) -> Result<Complaint> {
        self.complaints
            .get(&id)
            .map(|c| c.clone())
            .ok_or(Error::NotFound(id))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.complaints.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.complaints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.complaints.is_empty()
    }

    /// Run `f` against the complaint under its entry lock. No other
    /// mutation on the same id can interleave. The lock is held only
    /// for the duration of `f`, never across I/O.
    pub fn mutate<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Complaint) -> Result<T>,
    ) -> Result<T> {
        let mut entry = self.complaints.get_mut(&id).ok_or(Error::NotFound(id))?;
        f(entry.value_mut())
    }

    pub fn update_status(&self, id: Uuid, new_status: ComplaintStatus) -> Result<()> {
        self.mutate(id, |c| {
            c.status = new_status;
            Ok(())
        })
    }

    pub fn append_escalation(
        &self,
        id: Uuid,
        entry: grievance_core::EscalationEntry,
    ) -> Result<()> {
        self.mutate(id, |c| {
            c.escalation_history.push(entry);
            Ok(())
        })
    }

    /// Clone every record. Each clone is immutable with respect to
    /// the live store.
    pub fn all(&self) -> Vec<Complaint> {
        self.complaints.iter().map(|c| c.clone()).collect()
    }

    /// Filtered, sorted, paginated query. Limit is clamped to
    /// [`MAX_PAGE_SIZE`]; page numbers start at 1.
    pub fn list(&self, filters: &Filters, page: Page, sort: SortOrder) -> PageResult {
        let mut matches: Vec<Complaint> = self
            .complaints
            .iter()
            .filter(|c| filters.matches(c))
            .map(|c| c.clone())
            .collect();
        // Secondary key keeps pagination stable across equal timestamps.
        matches.sort_by_key(|c| (c.timestamp, c.id));
        if sort == SortOrder::NewestFirst {
            matches.reverse();
        }

        let total = matches.len();
        let limit = page.limit.clamp(1, MAX_PAGE_SIZE);
        let page_no = page.page.max(1);
        let start = (page_no - 1).saturating_mul(limit);
        let complaints = if start >= total {
            Vec::new()
        } else {
            matches[start..(start + limit).min(total)].to_vec()
        };
        PageResult {
            complaints,
            total,
            page: page_no,
            limit,
        }
    }

    /// Explicit erasure: physically remove a record. The lifecycle
    /// never calls this; archival is a status transition.
    pub fn erase(&self, id: Uuid) -> Result<Complaint> {
        let (_, removed) = self.complaints.remove(&id).ok_or(Error::NotFound(id))?;
        info!(%id, "erased complaint record");
        Ok(removed)
    }
}
