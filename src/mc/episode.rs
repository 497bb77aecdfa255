//! Episode buffer.
//!
//! Steps are appended while an episode is played and handed to the update
//! rule once it is over. A buffer that is cleared before the episode ends
//! never reaches the Q-table.

use serde::Serialize;

use crate::mc::config::ReturnDiscount;

/// One decision of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpisodeStep<S, A> {
    /// State observed before acting.
    pub state: S,
    /// Action taken in that state.
    pub action: A,
    /// Reward received for the action.
    pub reward: f64,
}

/// Ordered steps of a single episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode<S, A> {
    steps: Vec<EpisodeStep<S, A>>,
}

impl<S, A> Default for Episode<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Episode<S, A> {
    /// Create an empty episode.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step.
    pub fn push(&mut self, state: S, action: A, reward: f64) {
        self.steps.push(EpisodeStep {
            state,
            action,
            reward,
        });
    }

    /// Steps in the order they were played.
    pub fn steps(&self) -> &[EpisodeStep<S, A>] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drop all recorded steps.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Take the recorded steps, leaving the buffer empty.
    pub fn take(&mut self) -> Self {
        Self {
            steps: std::mem::take(&mut self.steps),
        }
    }

    /// Undiscounted sum of rewards.
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|step| step.reward).sum()
    }

    /// Return of every step, in step order.
    ///
    /// `returns[t]` sums `reward[t..]`, the reward `i` steps after `t`
    /// weighted by [`ReturnDiscount::factor`]`(gamma, i)`.
    pub fn returns(&self, gamma: f64, discount: ReturnDiscount) -> Vec<f64> {
        (0..self.steps.len())
            .map(|t| {
                self.steps[t..]
                    .iter()
                    .enumerate()
                    .map(|(offset, step)| step.reward * discount.factor(gamma, offset))
                    .sum()
            })
            .collect()
    }
}

impl<S, A> FromIterator<(S, A, f64)> for Episode<S, A> {
    fn from_iter<I: IntoIterator<Item = (S, A, f64)>>(iter: I) -> Self {
        let mut episode = Episode::new();
        for (state, action, reward) in iter {
            episode.push(state, action, reward);
        }
        episode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_episode_has_no_returns() {
        let episode: Episode<u8, u8> = Episode::new();
        assert!(episode.is_empty());
        assert!(episode.returns(0.9, ReturnDiscount::Shifted).is_empty());
    }

    #[test]
    fn test_shifted_returns_discount_own_reward() {
        let episode: Episode<u8, u8> = vec![(0, 1, 0.0), (1, 1, 0.0), (2, 0, 1.0)]
            .into_iter()
            .collect();

        // 0.5^3, 0.5^2, 0.5^1
        assert_eq!(
            episode.returns(0.5, ReturnDiscount::Shifted),
            vec![0.125, 0.25, 0.5]
        );
    }

    #[test]
    fn test_textbook_returns_keep_own_reward() {
        let episode: Episode<u8, u8> = vec![(0, 1, 0.0), (1, 1, 0.0), (2, 0, 1.0)]
            .into_iter()
            .collect();

        assert_eq!(
            episode.returns(0.5, ReturnDiscount::Textbook),
            vec![0.25, 0.5, 1.0]
        );
    }

    #[test]
    fn test_conventions_agree_without_discounting() {
        let episode: Episode<u8, u8> = vec![(0, 1, 0.0), (1, 0, -1.0)].into_iter().collect();
        assert_eq!(
            episode.returns(1.0, ReturnDiscount::Shifted),
            episode.returns(1.0, ReturnDiscount::Textbook)
        );
        assert_eq!(episode.total_reward(), -1.0);
    }

    #[test]
    fn test_take_empties_buffer() {
        let mut episode: Episode<u8, u8> = Episode::new();
        episode.push(1, 0, 1.0);
        let taken = episode.take();
        assert_eq!(taken.len(), 1);
        assert!(episode.is_empty());
    }
}
