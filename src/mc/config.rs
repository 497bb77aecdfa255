//! Configuration options for Monte Carlo control.
//!
//! This module provides the learning parameters (exploration, discounting,
//! step size), the convention used to discount returns, and the running
//! statistics collected while episodes are played.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mc::game::Outcome;

/// How rewards are discounted when computing the return of a step.
///
/// For a step `t` in an episode of length `T`:
///
/// ```text
/// Shifted:  G_t = sum_{i=0}^{T-t-1} reward[t+i] * gamma^(i+1)
/// Textbook: G_t = sum_{i=0}^{T-t-1} reward[t+i] * gamma^i
/// ```
///
/// The two agree whenever `gamma == 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnDiscount {
    /// The reward of step `t` is itself discounted once.
    #[default]
    Shifted,
    /// The reward of step `t` is undiscounted.
    Textbook,
}

impl ReturnDiscount {
    /// Discount applied to the reward `offset` steps after the current one.
    #[inline]
    pub fn factor(self, gamma: f64, offset: usize) -> f64 {
        let exponent = match self {
            ReturnDiscount::Shifted => offset + 1,
            ReturnDiscount::Textbook => offset,
        };
        gamma.powi(exponent as i32)
    }
}

/// Configuration for Monte Carlo control.
///
/// # Example
/// ```
/// use blackjack_mc::mc::MCConfig;
///
/// let config = MCConfig::default();
/// assert_eq!(config.epsilon, 0.1);
/// assert_eq!(config.alpha, 0.02);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MCConfig {
    /// Probability given to the non-greedy action by the epsilon-greedy policy.
    pub epsilon: f64,

    /// Discount factor applied to future rewards.
    pub gamma: f64,

    /// Constant step size of the incremental update.
    pub alpha: f64,

    /// Discounting convention for returns.
    pub return_discount: ReturnDiscount,

    /// Number of threads for parallel episode generation.
    ///
    /// Set to `None` to use the rayon default (all available cores).
    pub num_threads: Option<usize>,

    /// Random seed for reproducibility.
    ///
    /// If set, card draws and policy sampling are reproducible. If `None`,
    /// a random seed is used.
    pub seed: Option<u64>,
}

impl Default for MCConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            gamma: 1.0,
            alpha: 0.02,
            return_discount: ReturnDiscount::Shifted,
            num_threads: None,
            seed: None,
        }
    }
}

impl MCConfig {
    /// Create a new MCConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set exploration probability.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self
    }

    /// Builder method: set discount factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Builder method: set step size.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method: set the return discounting convention.
    pub fn with_return_discount(mut self, return_discount: ReturnDiscount) -> Self {
        self.return_discount = return_discount;
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_range("epsilon", self.epsilon)?;
        check_unit_range("gamma", self.gamma)?;
        check_unit_range("alpha", self.alpha)?;

        if self.num_threads == Some(0) {
            return Err(ConfigError::NoThreads);
        }

        Ok(())
    }
}

fn check_unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange { name, value });
    }
    Ok(())
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A probability or rate is outside [0, 1].
    #[error("{name} {value} is out of range [0, 1]")]
    OutOfRange {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The dealer's drawing threshold cannot exceed 21.
    #[error("dealer limit {0} is above 21")]
    InvalidDealerLimit(u8),
    /// A thread pool needs at least one thread.
    #[error("num_threads must be at least 1")]
    NoThreads,
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),
    /// The configuration could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Running statistics over played episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Total number of completed episodes.
    pub played: u64,

    /// Episodes won by the agent (or player).
    pub won: u64,

    /// Episodes not won, pushes included.
    pub lost: u64,

    /// How many of the lost episodes were pushes.
    pub drawn: u64,

    /// Number of distinct states in the Q-table.
    pub states: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Episodes per second.
    pub episodes_per_second: f64,
}

impl EpisodeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed episode.
    pub fn record(&mut self, outcome: Outcome) {
        self.played += 1;
        match outcome {
            Outcome::Win => self.won += 1,
            Outcome::Loss => self.lost += 1,
            Outcome::Push => {
                self.lost += 1;
                self.drawn += 1;
            }
        }
    }

    /// Fraction of played episodes that were won.
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            0.0
        } else {
            self.won as f64 / self.played as f64
        }
    }

    /// Update episodes per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.episodes_per_second = self.played as f64 / self.elapsed_seconds;
        }
    }
}
