//! Blackjack against a fixed-threshold dealer.
//!
//! Cards are drawn with replacement, so there is no deck to run out and no
//! card counting. The player sees their own total, the dealer's face-up
//! total, and whether they hold a usable Ace; those three values are the
//! state the agent learns over.
//!
//! ## Rewards
//!
//! - Win: +1
//! - Loss: -1
//! - Push: -1 (counted as a loss)
//!
//! Every non-final step gives 0.
//!
//! ## Example
//!
//! ```
//! use blackjack_mc::games::blackjack::{BlackjackAction, BlackjackSession, SessionConfig};
//! use blackjack_mc::mc::MCConfig;
//!
//! let config = SessionConfig::default().with_control(MCConfig::default().with_seed(42));
//! let mut session = BlackjackSession::new(config).unwrap();
//!
//! if !session.is_terminal() {
//!     let step = session.step_episode(BlackjackAction::Stick).unwrap();
//!     assert!(step.outcome.is_some());
//! }
//! assert_eq!(session.stats().played, 1);
//! ```

pub mod card;
pub mod export;
pub mod hand;
pub mod session;
pub mod surface;
pub mod table;

pub use card::{Card, CardSource, ScriptedCards, UniformCards};
pub use export::{TrainingMetadata, TrainingOutput};
pub use hand::{hand_sum, has_usable_ace, DealtCard, Hand, BLACKJACK};
pub use session::{BlackjackSession, SessionConfig, SessionError, Step};
pub use surface::ValueSurface;
pub use table::{
    resolve_outcome, BlackjackAction, BlackjackState, BlackjackTable, Phase, TableRules,
    DEFAULT_DEALER_LIMIT,
};
