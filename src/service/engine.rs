use crate::balance::accumulator::BalanceAccumulator;
use crate::balance::matrix::Balance;
use crate::core::ledger::{LedgerSnapshot, SnapshotSource};
use crate::core::member::{GroupId, MemberId};
use crate::core::money::Money;
use crate::service::error::EngineError;
use crate::service::singleflight::{Admission, RecomputeGate};
use crate::settlement::plan::SettlementPlan;
use crate::settlement::simplifier::SettlementSimplifier;
use crate::split::resolver::SplitResolver;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Everything the query surface derives from one ledger snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub group: GroupId,
    /// The ledger sequence number this report was computed at.
    pub sequence: u64,
    /// Scalar net position per member: positive = net creditor.
    pub positions: BTreeMap<MemberId, Money>,
    /// All member pairs with a nonzero net balance.
    pub balances: Vec<Balance>,
    /// Minimal transfer list that zeroes every position.
    pub plan: SettlementPlan,
}

/// Read-only query surface over a ledger source.
///
/// Both operations are side-effect-free with respect to the ledger: a
/// recomputation reads one consistent snapshot, folds it, and publishes
/// the derived report into a cache keyed by the snapshot's sequence
/// number. The cache is consulted only while the source's head sequence
/// still matches, so any append invalidates it implicitly.
///
/// Recomputations for different groups are independent; per group, the
/// [`RecomputeGate`] keeps at most one in flight and collapses a burst of
/// requests into the newest one.
#[derive(Debug, Default)]
pub struct LedgerService {
    cache: Mutex<HashMap<GroupId, Arc<GroupReport>>>,
    gate: RecomputeGate,
}

impl LedgerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one snapshot into a report. Pure: no caches, no locks, no
    /// side effects — safe to abandon at any point.
    pub fn compute(snapshot: &LedgerSnapshot) -> Result<GroupReport, EngineError> {
        let resolver = SplitResolver::new(snapshot.base_currency.clone());
        let mut splits = Vec::with_capacity(snapshot.record_count());
        for record in &snapshot.expenses {
            splits.push(resolver.resolve(record)?);
        }
        for record in &snapshot.settlements {
            splits.push(resolver.resolve_settlement(record)?);
        }

        let matrix = BalanceAccumulator::fold(&splits);
        let balances = matrix.pair_balances();
        let plan = SettlementSimplifier::simplify(&matrix)?;
        debug!(
            "folded {} records for {} at sequence {}: {} pair balances, {} transfers",
            snapshot.record_count(),
            snapshot.group,
            snapshot.sequence,
            balances.len(),
            plan.len()
        );

        Ok(GroupReport {
            group: snapshot.group.clone(),
            sequence: snapshot.sequence,
            positions: matrix.positions(),
            balances,
            plan,
        })
    }

    /// The current report for a group, recomputing if the cached one is
    /// out of date.
    pub fn report(
        &self,
        source: &impl SnapshotSource,
        group: &GroupId,
    ) -> Result<Arc<GroupReport>, EngineError> {
        let head = source
            .head(group)
            .ok_or_else(|| EngineError::UnknownGroup(group.clone()))?;
        if let Some(cached) = self.cached(group) {
            if cached.sequence == head {
                debug!("cache hit for {} at sequence {}", group, head);
                return Ok(cached);
            }
        }

        match self.gate.begin(group, head) {
            Admission::Lead => loop {
                match self.run_once(source, group) {
                    Ok(report) => {
                        if self.gate.complete(group).is_some() {
                            // A newer request queued up while folding;
                            // run again against the fresh head.
                            continue;
                        }
                        return Ok(report);
                    }
                    Err(err) => {
                        self.gate.release(group);
                        return Err(err);
                    }
                }
            },
            Admission::Follow => match self.cached(group) {
                // The leader published while we waited. Possibly one
                // sequence behind, which is an accepted answer.
                Some(report) => Ok(report),
                // Leader failed and released; compute directly.
                None => self.run_once(source, group),
            },
        }
    }

    /// All member pairs with a nonzero net balance.
    pub fn balances(
        &self,
        source: &impl SnapshotSource,
        group: &GroupId,
    ) -> Result<Vec<Balance>, EngineError> {
        Ok(self.report(source, group)?.balances.clone())
    }

    /// The minimal transfer list that settles the group.
    pub fn settlement_plan(
        &self,
        source: &impl SnapshotSource,
        group: &GroupId,
    ) -> Result<SettlementPlan, EngineError> {
        Ok(self.report(source, group)?.plan.clone())
    }

    /// A report pinned to a specific ledger sequence.
    ///
    /// Fails with [`EngineError::StaleSnapshot`] if the ledger has moved
    /// past `sequence`; the caller is expected to retry against the
    /// latest snapshot. This is the only error worth retrying.
    pub fn report_at(
        &self,
        source: &impl SnapshotSource,
        group: &GroupId,
        sequence: u64,
    ) -> Result<Arc<GroupReport>, EngineError> {
        let head = source
            .head(group)
            .ok_or_else(|| EngineError::UnknownGroup(group.clone()))?;
        if head != sequence {
            return Err(EngineError::StaleSnapshot {
                group: group.clone(),
                requested: sequence,
                latest: head,
            });
        }
        let report = self.report(source, group)?;
        if report.sequence != sequence {
            return Err(EngineError::StaleSnapshot {
                group: group.clone(),
                requested: sequence,
                latest: report.sequence,
            });
        }
        Ok(report)
    }

    /// Snapshot, fold, publish. The publish step refuses to replace a
    /// newer cached report with an older one.
    fn run_once(
        &self,
        source: &impl SnapshotSource,
        group: &GroupId,
    ) -> Result<Arc<GroupReport>, EngineError> {
        let snapshot = source
            .snapshot(group)
            .ok_or_else(|| EngineError::UnknownGroup(group.clone()))?;
        let report = Arc::new(Self::compute(&snapshot)?);

        use std::collections::hash_map::Entry;
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        match cache.entry(group.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().sequence <= report.sequence {
                    slot.insert(Arc::clone(&report));
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&report));
            }
        }
        Ok(report)
    }

    fn cached(&self, group: &GroupId) -> Option<Arc<GroupReport>> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(group)
            .cloned()
    }
}
