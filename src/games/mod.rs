//! Environments for the Monte Carlo agent.
//!
//! Each game implements the [`Environment`](crate::mc::Environment) trait
//! with its own state and action types.
//!
//! ## Available Games
//!
//! - [`blackjack`]: Blackjack against a dealer who draws to a fixed total
//!
//! ## Adding New Games
//!
//! 1. Create a new module under `src/games/`
//! 2. Define state and action types (`impl_action!` covers the action trait)
//! 3. Implement `Environment`
//! 4. Add tests with a scripted source of randomness

pub mod blackjack;
