//! Storage for action values.
//!
//! This module provides the Q-table: a map from state to the pair of action
//! values learned for it. Unseen states read as zero without being inserted,
//! and the table only ever grows.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::mc::game::{Action, StateKey, NUM_ACTIONS};

/// Estimated return of each action in a state, indexed by [`Action::index`].
pub type ActionValues = [f64; NUM_ACTIONS];

/// Action values of a state that has never been updated.
pub const ZERO_VALUES: ActionValues = [0.0; NUM_ACTIONS];

/// Action-value table.
///
/// The table has a single writer (the update rule) and is read by the
/// policy. Readers use [`QTable::get`], which never inserts; the update path
/// goes through [`QTable::get_or_insert_default`].
#[derive(Debug, Clone)]
pub struct QTable<S: StateKey> {
    /// state -> [value per action]
    values: FxHashMap<S, ActionValues>,
}

impl<S: StateKey> Default for QTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateKey> QTable<S> {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }

    /// Action values for a state, or zeros if the state was never updated.
    #[inline]
    pub fn get(&self, state: &S) -> ActionValues {
        self.values.get(state).copied().unwrap_or(ZERO_VALUES)
    }

    /// Value of a single action in a state.
    #[inline]
    pub fn value<A: Action>(&self, state: &S, action: A) -> f64 {
        self.get(state)[action.index()]
    }

    /// Mutable action values for a state, inserting zeros first if absent.
    pub fn get_or_insert_default(&mut self, state: S) -> &mut ActionValues {
        self.values.entry(state).or_insert(ZERO_VALUES)
    }

    /// Move the value of `(state, action)` a fraction `alpha` toward `target`.
    ///
    /// Reads the current value, so repeated updates of the same pair compound.
    /// Returns the new value.
    pub fn update<A: Action>(&mut self, state: S, action: A, target: f64, alpha: f64) -> f64 {
        let values = self.get_or_insert_default(state);
        let slot = &mut values[action.index()];
        *slot += alpha * (target - *slot);
        *slot
    }

    /// Number of states stored.
    pub fn num_states(&self) -> usize {
        self.values.len()
    }

    /// Whether no state has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if a state has been stored.
    pub fn contains(&self, state: &S) -> bool {
        self.values.contains_key(state)
    }

    /// Iterate over stored states and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&S, &ActionValues)> {
        self.values.iter()
    }

    /// Copy of the current values, detached from the table.
    pub fn snapshot(&self) -> QSnapshot<S> {
        QSnapshot {
            values: self.values.clone(),
        }
    }
}

/// Point-in-time copy of a Q-table, for plotting and export.
#[derive(Debug, Clone, PartialEq)]
pub struct QSnapshot<S: StateKey> {
    values: FxHashMap<S, ActionValues>,
}

/// One exported row of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QEntry<S> {
    /// The state.
    pub state: S,
    /// Its action values.
    pub values: ActionValues,
}

impl<S: StateKey> QSnapshot<S> {
    /// Action values for a state, or zeros if absent.
    pub fn get(&self, state: &S) -> ActionValues {
        self.values.get(state).copied().unwrap_or(ZERO_VALUES)
    }

    /// Check if a state is present.
    pub fn contains(&self, state: &S) -> bool {
        self.values.contains_key(state)
    }

    /// Number of states in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over states and values.
    pub fn iter(&self) -> impl Iterator<Item = (&S, &ActionValues)> {
        self.values.iter()
    }

    /// State values `V(s) = max_a Q(s, a)`.
    pub fn state_values(&self) -> FxHashMap<S, f64> {
        self.values
            .iter()
            .map(|(state, values)| {
                let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (*state, best)
            })
            .collect()
    }

    /// Rows suitable for serialization, in unspecified order.
    pub fn entries(&self) -> Vec<QEntry<S>> {
        self.values
            .iter()
            .map(|(state, values)| QEntry {
                state: *state,
                values: *values,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_action;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Lever {
        Left,
        Right,
    }

    impl_action!(Lever, [Lever::Left => "left", Lever::Right => "right"]);

    #[test]
    fn test_unseen_state_reads_zero_without_insert() {
        let table: QTable<u8> = QTable::new();
        assert_eq!(table.get(&7), [0.0, 0.0]);
        assert_eq!(table.value(&7, Lever::Right), 0.0);
        assert!(table.is_empty());
        assert!(!table.contains(&7));
    }

    #[test]
    fn test_get_or_insert_default_inserts_zeros() {
        let mut table: QTable<u8> = QTable::new();
        assert_eq!(*table.get_or_insert_default(3), [0.0, 0.0]);
        assert!(table.contains(&3));
        assert_eq!(table.num_states(), 1);
    }

    #[test]
    fn test_update_moves_toward_target() {
        let mut table: QTable<u8> = QTable::new();
        assert_eq!(table.update(1, Lever::Right, 1.0, 0.5), 0.5);
        assert_eq!(table.update(1, Lever::Right, 1.0, 0.5), 0.75);
        assert_eq!(table.get(&1), [0.0, 0.75]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut table: QTable<u8> = QTable::new();
        table.update(1, Lever::Left, 2.0, 1.0);
        let snapshot = table.snapshot();
        table.update(1, Lever::Left, 0.0, 1.0);

        assert_eq!(snapshot.get(&1), [2.0, 0.0]);
        assert_eq!(table.get(&1), [0.0, 0.0]);
    }

    #[test]
    fn test_state_values_take_max() {
        let mut table: QTable<u8> = QTable::new();
        table.update(1, Lever::Left, -0.5, 1.0);
        table.update(2, Lever::Right, 0.25, 1.0);
        table.update(2, Lever::Left, 0.75, 1.0);

        let values = table.snapshot().state_values();
        assert_eq!(values[&1], 0.0);
        assert_eq!(values[&2], 0.75);
    }
}
