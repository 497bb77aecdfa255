//! Tabular Monte Carlo control.
//!
//! This module provides a generic every-visit, constant-step-size Monte Carlo
//! control agent for episodic environments with two actions.
//!
//! # Overview
//!
//! Each episode is played to completion with an epsilon-greedy policy over
//! the current action values. The finished episode is then walked front to
//! back, and every visited `(state, action)` pair is moved toward the return
//! observed from that step:
//!
//! ```text
//! G_t = sum_{i=0}^{T-t-1} reward[t+i] * gamma^(i+1)
//! Q[s_t][a_t] += alpha * (G_t - Q[s_t][a_t])
//! ```
//!
//! Pairs visited more than once in an episode are updated once per visit.
//!
//! # Usage
//!
//! 1. Implement [`Environment`] for your game
//! 2. Create a [`MonteCarloAgent`] with the environment and an [`MCConfig`]
//! 3. Call `train()`, or drive it step by step with `step()`
//! 4. Read the learned values with `q()` or `q_snapshot()`
//!
//! # Example
//!
//! ```ignore
//! use blackjack_mc::mc::{MCConfig, MonteCarloAgent};
//!
//! let mut agent = MonteCarloAgent::new(my_env, MCConfig::default().with_seed(1));
//! let stats = agent.train(500_000)?;
//! println!("{} states after {} episodes", stats.states, stats.played);
//! ```
//!
//! # References
//!
//! - Sutton, R., Barto, A. "Reinforcement Learning: An Introduction", ch. 5 (2018)

pub mod agent;
pub mod config;
pub mod episode;
pub mod game;
pub mod policy;
pub mod storage;

// Re-export main types for convenient access
pub use agent::{generate_episode, update_q, MonteCarloAgent, TrainError};
pub use config::{ConfigError, EpisodeStats, MCConfig, ReturnDiscount};
pub use episode::{Episode, EpisodeStep};
pub use game::{Action, Environment, Outcome, StateKey, StepError, Transition, NUM_ACTIONS};
pub use policy::{greedy_action, EpsilonGreedy};
pub use storage::{ActionValues, QEntry, QSnapshot, QTable};
