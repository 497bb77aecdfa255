//! # Blackjack Monte Carlo
//!
//! A Blackjack simulator driving a tabular Monte Carlo control agent that
//! learns when to hit and when to stick.
//!
//! ## Features
//!
//! - **Generic MC Engine**: Works with any two-action game implementing the `Environment` trait
//! - **Every-Visit Updates**: Constant step size, so the agent keeps tracking a changing policy
//! - **Interactive Play**: A human plays with AI mode off; those games count but are not learned
//! - **Parallel Training**: Episodes generated on a rayon pool, applied in a fixed order
//! - **Value Export**: State-value surfaces for plotting
//!
//! ## Quick Start
//!
//! ```no_run
//! use blackjack_mc::games::blackjack::{BlackjackSession, SessionConfig};
//!
//! let mut session = BlackjackSession::new(SessionConfig::default()).unwrap();
//! session.train(100_000).unwrap();
//!
//! let surface = session.q_snapshot().value_surface(false);
//! println!("V(20, dealer 10) = {:?}", surface.get(20, 10));
//! ```
//!
//! ## Modules
//!
//! - [`mc`]: Core Monte Carlo control algorithm
//! - [`games`]: Environments (Blackjack)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 MonteCarloAgent (Generic)                       │
//! │  - Epsilon-greedy policy  - Every-visit return updates          │
//! │  - Serial/parallel train  - Q-table snapshots                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements Environment trait
//!                               ▼
//!                       ┌───────────────┐
//!                       │ BlackjackTable│ ◄── BlackjackSession
//!                       └───────────────┘
//! ```

#![warn(missing_docs)]

/// Monte Carlo control module.
///
/// This is the core module containing the generic learning algorithm.
pub mod mc;

/// Game implementations module.
///
/// Contains the Blackjack table and the session wrapper used to play it.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use games::blackjack::{BlackjackAction, BlackjackSession, BlackjackState, SessionConfig};
pub use mc::{Environment, EpisodeStats, MCConfig, MonteCarloAgent, Outcome};
