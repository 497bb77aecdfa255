//! State-value grids for plotting.
//!
//! The learned values are drawn as two surfaces, one for hands with a usable
//! Ace and one without, over the player's total and the dealer's face-up
//! total. Player totals below 11 are left out since hitting there can never
//! bust.

use serde::Serialize;

use crate::games::blackjack::table::BlackjackState;
use crate::mc::storage::QSnapshot;

/// Player totals on the surface's first axis.
pub const PLAYER_SUMS: std::ops::RangeInclusive<u8> = 11..=21;

/// Dealer face-up totals on the second axis.
///
/// A lone face-up card shows 2..=11 (an Ace as 11). A face-down Ace lifts
/// the face-up total by 10, up to 19 under a face-up 9.
pub const DEALER_SHOWING: std::ops::RangeInclusive<u8> = 2..=19;

/// `V(s) = max_a Q(s, a)` over the plotting grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueSurface {
    /// Which half of the state space this grid covers.
    pub usable_ace: bool,
    /// Row labels.
    pub player_sums: Vec<u8>,
    /// Column labels.
    pub dealer_showing: Vec<u8>,
    /// `values[row][col]`; states never updated read as 0.0.
    pub values: Vec<Vec<f64>>,
}

impl ValueSurface {
    /// Value at a grid point, or `None` if it lies off the grid.
    pub fn get(&self, player_sum: u8, dealer_showing: u8) -> Option<f64> {
        let row = self.player_sums.iter().position(|&p| p == player_sum)?;
        let col = self.dealer_showing.iter().position(|&d| d == dealer_showing)?;
        Some(self.values[row][col])
    }
}

impl QSnapshot<BlackjackState> {
    /// Build the value grid for one half of the state space.
    pub fn value_surface(&self, usable_ace: bool) -> ValueSurface {
        let player_sums: Vec<u8> = PLAYER_SUMS.collect();
        let dealer_showing: Vec<u8> = DEALER_SHOWING.collect();

        let values = player_sums
            .iter()
            .map(|&player_sum| {
                dealer_showing
                    .iter()
                    .map(|&dealer| {
                        let state = BlackjackState::new(player_sum, dealer, usable_ace);
                        if self.contains(&state) {
                            self.get(&state).into_iter().fold(f64::NEG_INFINITY, f64::max)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        ValueSurface {
            usable_ace,
            player_sums,
            dealer_showing,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::blackjack::table::BlackjackAction;
    use crate::mc::storage::QTable;

    #[test]
    fn test_surface_shape_and_defaults() {
        let q: QTable<BlackjackState> = QTable::new();
        let surface = q.snapshot().value_surface(false);

        assert_eq!(surface.player_sums.len(), 11);
        assert_eq!(surface.dealer_showing.len(), 18);
        assert_eq!(surface.values.len(), 11);
        assert!(surface.values.iter().all(|row| row.len() == 18));
        assert!(surface.values.iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn test_surface_reads_max_action_value() {
        let mut q: QTable<BlackjackState> = QTable::new();
        let soft = BlackjackState::new(17, 11, true);
        q.update(soft, BlackjackAction::Stick, -0.4, 1.0);
        q.update(soft, BlackjackAction::Hit, -0.2, 1.0);
        let hard = BlackjackState::new(20, 16, false);
        q.update(hard, BlackjackAction::Stick, 0.7, 1.0);

        let snapshot = q.snapshot();
        let with_ace = snapshot.value_surface(true);
        let without_ace = snapshot.value_surface(false);

        assert_eq!(with_ace.get(17, 11), Some(-0.2));
        assert_eq!(without_ace.get(17, 11), Some(0.0));
        assert_eq!(without_ace.get(20, 16), Some(0.7));
        assert_eq!(without_ace.get(10, 6), None);
        assert_eq!(without_ace.get(17, 20), None);
    }
}
