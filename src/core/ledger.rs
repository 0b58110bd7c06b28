use crate::core::currency::CurrencyCode;
use crate::core::member::{GroupId, MemberId};
use crate::core::record::{ExpenseRecord, SettlementRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Errors arising from ledger mutations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("record {0} is not part of the live history")]
    UnknownRecord(Uuid),
}

/// One entry in a group's append-only history.
///
/// Edits and deletions are themselves entries: an edit appends a
/// replacement record pointing back at the version it supersedes, and a
/// deletion appends a retraction naming its target. Entries are never
/// mutated or removed, which is what makes replay deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Expense(ExpenseRecord),
    Settlement(SettlementRecord),
    Retraction {
        id: Uuid,
        target: Uuid,
        recorded_at: DateTime<Utc>,
    },
}

/// A consistent point-in-time view of one group's live history.
///
/// Contains only surviving records: versions that were superseded by an
/// edit or named by a retraction are filtered out. The `sequence` number
/// identifies the exact ledger state the snapshot was taken at; any later
/// append produces a snapshot with a higher sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub group: GroupId,
    pub sequence: u64,
    pub base_currency: CurrencyCode,
    pub members: Vec<MemberId>,
    pub expenses: Vec<ExpenseRecord>,
    pub settlements: Vec<SettlementRecord>,
}

impl LedgerSnapshot {
    /// Number of live records in this snapshot.
    pub fn record_count(&self) -> usize {
        self.expenses.len() + self.settlements.len()
    }
}

/// The append-only expense and settlement history of one group.
///
/// Every append bumps a monotonically increasing sequence number, so a
/// snapshot taken at sequence `s` can always be told apart from one taken
/// after further changes.
#[derive(Debug, Clone)]
pub struct GroupLedger {
    group: GroupId,
    base_currency: CurrencyCode,
    members: BTreeSet<MemberId>,
    entries: Vec<LedgerEntry>,
    sequence: u64,
}

impl GroupLedger {
    pub fn new(group: GroupId, base_currency: CurrencyCode) -> Self {
        Self {
            group,
            base_currency,
            members: BTreeSet::new(),
            entries: Vec::new(),
            sequence: 0,
        }
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    /// Current ledger sequence number. Starts at zero and bumps on every
    /// roster change, append, edit and retraction.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Add a member to the roster.
    pub fn add_member(&mut self, member: MemberId) {
        if self.members.insert(member) {
            self.sequence += 1;
        }
    }

    /// Append an expense record. Returns its id.
    pub fn record_expense(&mut self, record: ExpenseRecord) -> Uuid {
        assert_eq!(record.group(), &self.group, "record belongs to another group");
        let id = record.id();
        self.entries.push(LedgerEntry::Expense(record));
        self.sequence += 1;
        id
    }

    /// Append a settlement record. Returns its id.
    pub fn record_settlement(&mut self, record: SettlementRecord) -> Uuid {
        assert_eq!(record.group(), &self.group, "record belongs to another group");
        let id = record.id();
        self.entries.push(LedgerEntry::Settlement(record));
        self.sequence += 1;
        id
    }

    /// Replace a live expense with a corrected version.
    ///
    /// The old version stays in the entry log but drops out of every
    /// snapshot taken from here on; recomputing then yields the same
    /// result as if the replacement had been the only version ever
    /// recorded.
    pub fn amend_expense(
        &mut self,
        old: Uuid,
        replacement: ExpenseRecord,
    ) -> Result<Uuid, LedgerError> {
        if !self.is_live(old) {
            return Err(LedgerError::UnknownRecord(old));
        }
        Ok(self.record_expense(replacement.with_replaces(old)))
    }

    /// Retract a live record (expense or settlement) via a tombstone entry.
    pub fn retract(&mut self, target: Uuid) -> Result<Uuid, LedgerError> {
        if !self.is_live(target) {
            return Err(LedgerError::UnknownRecord(target));
        }
        let id = Uuid::new_v4();
        self.entries.push(LedgerEntry::Retraction {
            id,
            target,
            recorded_at: Utc::now(),
        });
        self.sequence += 1;
        Ok(id)
    }

    /// Whether a record id is present and not superseded or retracted.
    pub fn is_live(&self, id: Uuid) -> bool {
        let dead = self.dead_ids();
        self.entries.iter().any(|entry| match entry {
            LedgerEntry::Expense(e) => e.id() == id && !dead.contains(&id),
            LedgerEntry::Settlement(s) => s.id() == id && !dead.contains(&id),
            LedgerEntry::Retraction { .. } => false,
        })
    }

    /// Take a consistent snapshot of the live history at the current
    /// sequence number.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let dead = self.dead_ids();
        let mut expenses = Vec::new();
        let mut settlements = Vec::new();
        for entry in &self.entries {
            match entry {
                LedgerEntry::Expense(e) if !dead.contains(&e.id()) => expenses.push(e.clone()),
                LedgerEntry::Settlement(s) if !dead.contains(&s.id()) => {
                    settlements.push(s.clone())
                }
                _ => {}
            }
        }
        LedgerSnapshot {
            group: self.group.clone(),
            sequence: self.sequence,
            base_currency: self.base_currency.clone(),
            members: self.members.iter().cloned().collect(),
            expenses,
            settlements,
        }
    }

    /// Ids knocked out of the live history by an edit or retraction.
    fn dead_ids(&self) -> HashSet<Uuid> {
        let mut dead = HashSet::new();
        for entry in &self.entries {
            match entry {
                LedgerEntry::Expense(e) => {
                    if let Some(old) = e.replaces() {
                        dead.insert(old);
                    }
                }
                LedgerEntry::Settlement(s) => {
                    if let Some(old) = s.replaces() {
                        dead.insert(old);
                    }
                }
                LedgerEntry::Retraction { target, .. } => {
                    dead.insert(*target);
                }
            }
        }
        dead
    }
}

/// Supplies snapshot-consistent group histories to the query layer.
///
/// Implemented by whatever owns persistence; [`LedgerStore`] is the
/// in-memory reference implementation used by the CLI and tests.
pub trait SnapshotSource {
    /// A consistent snapshot of the group's live history, or `None` for an
    /// unknown group.
    fn snapshot(&self, group: &GroupId) -> Option<LedgerSnapshot>;

    /// The group's current ledger sequence number, or `None` for an
    /// unknown group.
    fn head(&self, group: &GroupId) -> Option<u64>;
}

/// In-memory multi-group ledger store.
#[derive(Debug, Default)]
pub struct LedgerStore {
    groups: HashMap<GroupId, GroupLedger>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group and return a mutable handle to its ledger.
    pub fn create_group(
        &mut self,
        group: GroupId,
        base_currency: CurrencyCode,
    ) -> &mut GroupLedger {
        self.groups
            .entry(group.clone())
            .or_insert_with(|| GroupLedger::new(group, base_currency))
    }

    pub fn group(&self, group: &GroupId) -> Option<&GroupLedger> {
        self.groups.get(group)
    }

    pub fn group_mut(&mut self, group: &GroupId) -> Option<&mut GroupLedger> {
        self.groups.get_mut(group)
    }
}

impl SnapshotSource for LedgerStore {
    fn snapshot(&self, group: &GroupId) -> Option<LedgerSnapshot> {
        self.groups.get(group).map(GroupLedger::snapshot)
    }

    fn head(&self, group: &GroupId) -> Option<u64> {
        self.groups.get(group).map(GroupLedger::sequence)
    }
}
