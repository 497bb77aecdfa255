//! Environment trait definition for Monte Carlo control.
//!
//! Any episodic, two-action environment that implements [`Environment`] can be
//! learned by the [`MonteCarloAgent`](crate::mc::MonteCarloAgent). This keeps
//! the learning algorithm independent of the rules of a specific game.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of actions available at every decision point.
pub const NUM_ACTIONS: usize = 2;

/// Trait for the actions of a two-action environment.
///
/// Each action maps to a slot (`0` or `1`) of the action-value pair stored
/// per state.
pub trait Action: Copy + Eq + Hash + Debug + Send + Sync {
    /// All actions, ordered by index.
    const ALL: [Self; NUM_ACTIONS];

    /// Slot of this action in an action-value pair.
    fn index(self) -> usize;

    /// Inverse of [`Action::index`]. Returns `None` for an unknown slot.
    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable name for display.
    fn name(self) -> &'static str;
}

/// Trait for the states used as Q-table keys.
///
/// States are small value types compared and hashed by value.
pub trait StateKey: Copy + Eq + Hash + Debug + Send + Sync {}

impl<T> StateKey for T where T: Copy + Eq + Hash + Debug + Send + Sync {}

/// Final result of an episode from the learner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The learner won.
    Win,
    /// The learner lost.
    Loss,
    /// Equal totals. Scored and counted as a loss.
    Push,
}

impl Outcome {
    /// Terminal reward for this outcome. Only a win pays; a push scores
    /// like a loss.
    pub fn reward(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss | Outcome::Push => -1.0,
        }
    }

    /// `Some(true)` for a win, `Some(false)` for a loss, `None` for a push.
    pub fn winner(self) -> Option<bool> {
        match self {
            Outcome::Win => Some(true),
            Outcome::Loss => Some(false),
            Outcome::Push => None,
        }
    }
}

/// Result of applying one action to an environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<S> {
    /// State observed after the action.
    pub state: S,
    /// Reward for the action. Nonzero only on the terminal step.
    pub reward: f64,
    /// Set once the episode is over.
    pub outcome: Option<Outcome>,
}

impl<S> Transition<S> {
    /// Whether the episode ended with this transition.
    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Errors raised when stepping an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    /// The action code is not one of the environment's actions.
    #[error("invalid action {0}, expected 0 (stick) or 1 (hit)")]
    InvalidAction(usize),
    /// The episode already reached a terminal state.
    #[error("episode is already finished")]
    EpisodeFinished,
}

/// The main trait for an episodic environment.
///
/// # Example
/// ```ignore
/// struct MyTable;
///
/// impl Environment for MyTable {
///     type State = MyState;
///     type Action = MyAction;
///
///     // ... implement required methods
/// }
/// ```
pub trait Environment {
    /// The observation used as a Q-table key.
    type State: StateKey;

    /// The action type.
    type Action: Action;

    /// Start a fresh episode and return its first state.
    ///
    /// Any episode in progress is abandoned. The fresh episode may already
    /// be terminal (for example a natural 21 on the deal).
    fn reset(&mut self) -> Self::State;

    /// The current observation.
    fn state(&self) -> Self::State;

    /// The final outcome, once the episode is terminal.
    fn outcome(&self) -> Option<Outcome>;

    /// Whether the current episode is over.
    fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// Apply an action.
    ///
    /// Returns [`StepError::EpisodeFinished`] without mutating anything if
    /// the episode is already terminal.
    fn step(&mut self, action: Self::Action) -> Result<Transition<Self::State>, StepError>;
}

/// Macro to implement [`Action`] for a two-variant enum.
///
/// ```ignore
/// impl_action!(MyAction, [MyAction::Left => "left", MyAction::Right => "right"]);
/// ```
#[macro_export]
macro_rules! impl_action {
    ($type:ty, [$first:path => $first_name:expr, $second:path => $second_name:expr]) => {
        impl $crate::mc::game::Action for $type {
            const ALL: [Self; $crate::mc::game::NUM_ACTIONS] = [$first, $second];

            fn index(self) -> usize {
                match self {
                    $first => 0,
                    $second => 1,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $first => $first_name,
                    $second => $second_name,
                }
            }
        }
    };
}
