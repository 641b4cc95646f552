//! Snapshot log
//!
//! Every state-mutating action pushes a full deep copy of the table into a
//! bounded ring so the host can undo or rewind a botched round. Snapshots
//! hold independent copies; nothing aliases back into live state, and a
//! stored snapshot is never mutated.

use super::card::Card;
use super::participant::Participant;
use super::table::{GamePhase, Table};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 25;

/// Immutable deep copy of the table at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub reason: String,
    pub phase: GamePhase,
    pub dealer: Participant,
    pub participants: Vec<Participant>,
    pub shoe: Vec<Card>,
}

impl Snapshot {
    pub fn capture(table: &Table, reason: &str) -> Self {
        Self {
            taken_at: Utc::now(),
            reason: reason.to_string(),
            phase: table.phase,
            dealer: table.dealer.clone(),
            participants: table.participants.clone(),
            shoe: table.shoe.snapshot(),
        }
    }

    /// Restore phase, dealer, participants and shoe onto a live table
    pub fn apply_to(&self, table: &mut Table) {
        table.phase = self.phase;
        table.dealer = self.dealer.clone();
        table.participants = self.participants.clone();
        table.shoe.restore(self.shoe.clone());
    }
}

/// Bounded history of table snapshots; the oldest entry is evicted first
#[derive(Debug)]
pub struct SnapshotLog {
    capacity: usize,
    snapshots: Mutex<VecDeque<Snapshot>>,
}

impl Default for SnapshotLog {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_CAPACITY)
    }
}

impl SnapshotLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            snapshots: Mutex::new(VecDeque::new()),
        }
    }

    /// Capture and store a snapshot, returning its index
    pub fn push_snapshot(&self, table: &Table, reason: &str) -> usize {
        let snapshot = Snapshot::capture(table, reason);
        let mut snapshots = self.snapshots.lock();
        if snapshots.len() == self.capacity {
            snapshots.pop_front();
        }
        snapshots.push_back(snapshot);
        snapshots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Snapshot> {
        self.snapshots.lock().get(index).cloned()
    }

    /// Restore the snapshot at `index` onto the table. The snapshot stays
    /// in the log; rewinding does not consume history.
    pub fn apply_snapshot(&self, index: usize, table: &mut Table) -> bool {
        let snapshot = match self.snapshots.lock().get(index) {
            Some(s) => s.clone(),
            None => return false,
        };
        snapshot.apply_to(table);
        true
    }

    /// Pop the newest snapshot and restore it onto the table
    pub fn undo_last(&self, table: &mut Table) -> bool {
        let snapshot = match self.snapshots.lock().pop_back() {
            Some(s) => s,
            None => return false,
        };
        snapshot.apply_to(table);
        true
    }

    pub fn clear(&self) {
        self.snapshots.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::hand::Hand;

    fn sample_table() -> Table {
        let mut table = Table::new("Croupier", 1);
        let mut p = Participant::new("Ann");
        p.current_bet = 100;
        p.bank = 900;
        p.hands.push(Hand::new(100));
        table.participants.push(p);
        table
    }

    #[test]
    fn round_trip_restores_exact_state() {
        let log = SnapshotLog::default();
        let mut table = sample_table();
        table.phase = GamePhase::PlayersTurn;
        let reference = table.clone();

        let index = log.push_snapshot(&table, "before hit");

        // Mutate everything the snapshot covers.
        table.phase = GamePhase::Payout;
        table.participants[0].bank = 0;
        table.participants[0].hands.clear();
        table.shoe.pull(7);

        assert!(log.apply_snapshot(index, &mut table));
        assert_eq!(table.phase, reference.phase);
        assert_eq!(table.dealer, reference.dealer);
        assert_eq!(table.participants, reference.participants);
        assert_eq!(table.shoe, reference.shoe);
    }

    #[test]
    fn undo_pops_the_newest_snapshot() {
        let log = SnapshotLog::default();
        let mut table = sample_table();

        log.push_snapshot(&table, "first");
        table.participants[0].bank = 500;
        log.push_snapshot(&table, "second");
        table.participants[0].bank = 0;

        assert!(log.undo_last(&mut table));
        assert_eq!(table.participants[0].bank, 500);
        assert!(log.undo_last(&mut table));
        assert_eq!(table.participants[0].bank, 900);
        assert!(!log.undo_last(&mut table));
    }

    #[test]
    fn ring_evicts_the_oldest_entry() {
        let log = SnapshotLog::new(2);
        let mut table = sample_table();

        table.participants[0].bank = 1;
        log.push_snapshot(&table, "a");
        table.participants[0].bank = 2;
        log.push_snapshot(&table, "b");
        table.participants[0].bank = 3;
        log.push_snapshot(&table, "c");

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).unwrap().participants[0].bank, 2);
        assert_eq!(log.get(1).unwrap().participants[0].bank, 3);
    }
}
