//! Epsilon-greedy action selection.
//!
//! The action with the larger value is taken with probability `1 - epsilon`
//! and the other one with probability `epsilon`. Equal values split 50/50.

use rand::Rng;

use crate::mc::game::{Action, StateKey, NUM_ACTIONS};
use crate::mc::storage::{ActionValues, QTable};

/// Epsilon-greedy policy over a Q-table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    /// Probability of the non-greedy action.
    pub epsilon: f64,
}

impl EpsilonGreedy {
    /// Create a policy with the given exploration probability.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Probability of each action given its values.
    pub fn probabilities(&self, values: &ActionValues) -> [f64; NUM_ACTIONS] {
        if values[1] > values[0] {
            [self.epsilon, 1.0 - self.epsilon]
        } else if values[0] > values[1] {
            [1.0 - self.epsilon, self.epsilon]
        } else {
            [0.5, 0.5]
        }
    }

    /// Sample an action for `state`. Unseen states have zero values.
    pub fn select<S, A, R>(&self, state: &S, q: &QTable<S>, rng: &mut R) -> A
    where
        S: StateKey,
        A: Action,
        R: Rng + ?Sized,
    {
        let probs = self.probabilities(&q.get(state));
        A::ALL[sample_index(&probs, rng)]
    }
}

/// Action with the larger value. Ties go to the action at index 0.
pub fn greedy_action<A: Action>(values: &ActionValues) -> A {
    if values[1] > values[0] {
        A::ALL[1]
    } else {
        A::ALL[0]
    }
}

/// Sample an index according to a probability distribution.
fn sample_index<R: Rng + ?Sized>(probs: &[f64; NUM_ACTIONS], rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &prob) in probs.iter().enumerate() {
        cumsum += prob;
        if r < cumsum {
            return i;
        }
    }

    // Floating point slack
    NUM_ACTIONS - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_action;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Move {
        Stay,
        Go,
    }

    impl_action!(Move, [Move::Stay => "stay", Move::Go => "go"]);

    fn frequency_of_stay(values: ActionValues, epsilon: f64, trials: usize) -> f64 {
        let mut q: QTable<u8> = QTable::new();
        *q.get_or_insert_default(0) = values;
        let policy = EpsilonGreedy::new(epsilon);
        let mut rng = StdRng::seed_from_u64(42);

        let stays = (0..trials)
            .filter(|_| policy.select::<u8, Move, _>(&0, &q, &mut rng) == Move::Stay)
            .count();
        stays as f64 / trials as f64
    }

    #[test]
    fn test_probabilities() {
        let policy = EpsilonGreedy::new(0.1);
        assert_eq!(policy.probabilities(&[5.0, 2.0]), [0.9, 0.1]);
        assert_eq!(policy.probabilities(&[-1.0, 0.0]), [0.1, 0.9]);
        assert_eq!(policy.probabilities(&[0.3, 0.3]), [0.5, 0.5]);
    }

    #[test]
    fn test_greedy_action_wins_with_one_minus_epsilon() {
        let freq = frequency_of_stay([5.0, 2.0], 0.1, 10_000);
        assert!((freq - 0.9).abs() < 0.02, "stay frequency {} should be near 0.9", freq);

        let freq = frequency_of_stay([2.0, 5.0], 0.1, 10_000);
        assert!((freq - 0.1).abs() < 0.02, "stay frequency {} should be near 0.1", freq);
    }

    #[test]
    fn test_ties_split_evenly() {
        let freq = frequency_of_stay([0.0, 0.0], 0.1, 10_000);
        assert!((freq - 0.5).abs() < 0.02, "stay frequency {} should be near 0.5", freq);
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        assert_eq!(frequency_of_stay([1.0, 0.0], 0.0, 1_000), 1.0);
        assert_eq!(frequency_of_stay([0.0, 1.0], 0.0, 1_000), 0.0);
    }

    #[test]
    fn test_greedy_action_ties_to_first() {
        assert_eq!(greedy_action::<Move>(&[0.0, 0.0]), Move::Stay);
        assert_eq!(greedy_action::<Move>(&[0.0, 0.1]), Move::Go);
    }
}
