//! The Blackjack episode engine.
//!
//! ## Game Rules
//!
//! - Cards are drawn with replacement; face cards score 10
//! - The dealer gets two cards (the second face down), then the player two
//! - The player hits or sticks
//! - Sticking reveals the dealer's card; the dealer then draws while their
//!   total is at or below the dealer limit (18 by default)
//!
//! ## Turn Structure
//!
//! ```text
//! PLAYER_TURN
//! ├── Hit ──► player > 21 → Loss | player == 21 → Win | else PLAYER_TURN
//! └── Stick ─► reveal, dealer draws to completion ─► compare → TERMINAL
//! ```
//!
//! The dealer's turn runs to completion inside the `Stick` transition and is
//! never observed from outside. The outcome is re-checked after the deal and
//! after every transition, so a deal can be terminal before any decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::games::blackjack::card::{CardSource, UniformCards};
use crate::games::blackjack::hand::{Hand, BLACKJACK};
use crate::impl_action;
use crate::mc::game::{Environment, Outcome, StepError, Transition};

/// Default total at or below which the dealer keeps drawing.
pub const DEFAULT_DEALER_LIMIT: u8 = 18;

/// Actions available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackAction {
    /// Stop drawing and let the dealer play.
    Stick = 0,
    /// Draw one more card.
    Hit = 1,
}

impl_action!(BlackjackAction, [BlackjackAction::Stick => "stick", BlackjackAction::Hit => "hit"]);

impl TryFrom<u8> for BlackjackAction {
    type Error = StepError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(BlackjackAction::Stick),
            1 => Ok(BlackjackAction::Hit),
            other => Err(StepError::InvalidAction(other as usize)),
        }
    }
}

impl fmt::Display for BlackjackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlackjackAction::Stick => write!(f, "Stick"),
            BlackjackAction::Hit => write!(f, "Hit"),
        }
    }
}

/// What the player observes at a decision point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlackjackState {
    /// Best total of the player's hand.
    pub player_sum: u8,
    /// Best total of the dealer's face-up cards.
    pub dealer_visible_sum: u8,
    /// Whether the player holds an Ace counted as 11.
    pub usable_ace: bool,
}

impl BlackjackState {
    /// Create a state.
    pub fn new(player_sum: u8, dealer_visible_sum: u8, usable_ace: bool) -> Self {
        Self {
            player_sum,
            dealer_visible_sum,
            usable_ace,
        }
    }
}

impl fmt::Display for BlackjackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ace = if self.usable_ace { "ace" } else { "no-ace" };
        write!(f, "{}/{}/{}", self.player_sum, self.dealer_visible_sum, ace)
    }
}

/// Phase of the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Waiting for the player's action.
    PlayerTurn,
    /// The dealer is drawing. Only held inside a `Stick` transition.
    DealerTurn,
    /// The episode is over.
    Terminal,
}

/// Table rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRules {
    /// The dealer draws while their full total is at or below this.
    pub dealer_limit: u8,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            dealer_limit: DEFAULT_DEALER_LIMIT,
        }
    }
}

/// Settle a hand from the two totals.
///
/// Checks run in a fixed order: player bust, player 21, dealer 21, dealer
/// still to play, dealer bust, then comparison. Returns `None` while the
/// episode goes on.
pub fn resolve_outcome(
    dealer_turn_finished: bool,
    player_sum: u8,
    dealer_full_sum: u8,
) -> Option<Outcome> {
    if player_sum > BLACKJACK {
        return Some(Outcome::Loss);
    }
    if player_sum == BLACKJACK {
        return Some(Outcome::Win);
    }
    if dealer_full_sum == BLACKJACK {
        return Some(Outcome::Loss);
    }
    if !dealer_turn_finished {
        return None;
    }
    if dealer_full_sum > BLACKJACK {
        return Some(Outcome::Win);
    }

    Some(match player_sum.cmp(&dealer_full_sum) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => Outcome::Push,
    })
}

/// One Blackjack table: a card source, the two hands, and the turn state.
#[derive(Debug, Clone)]
pub struct BlackjackTable<C: CardSource = UniformCards> {
    cards: C,
    rules: TableRules,
    player: Hand,
    dealer: Hand,
    phase: Phase,
    dealer_turn_finished: bool,
    outcome: Option<Outcome>,
}

impl BlackjackTable<UniformCards> {
    /// Create a table with a reproducible random card source.
    pub fn seeded(seed: u64, rules: TableRules) -> Self {
        Self::new(UniformCards::seeded(seed), rules)
    }
}

impl<C: CardSource> BlackjackTable<C> {
    /// Create a table and deal the first episode.
    pub fn new(cards: C, rules: TableRules) -> Self {
        let mut table = Self {
            cards,
            rules,
            player: Hand::new(),
            dealer: Hand::new(),
            phase: Phase::PlayerTurn,
            dealer_turn_finished: false,
            outcome: None,
        };
        table.deal();
        table
    }

    /// Deal a fresh episode: dealer up card, dealer hole card, then two
    /// player cards.
    fn deal(&mut self) {
        self.player.clear();
        self.dealer.clear();

        self.dealer.push(self.cards.draw());
        self.dealer.push_hidden(self.cards.draw());
        self.player.push(self.cards.draw());
        self.player.push(self.cards.draw());

        self.phase = Phase::PlayerTurn;
        self.dealer_turn_finished = false;
        self.settle();
    }

    /// Re-check the outcome and enter the terminal phase if it is decided.
    fn settle(&mut self) {
        self.outcome = resolve_outcome(
            self.dealer_turn_finished,
            self.player.sum(),
            self.dealer.sum(),
        );
        if self.outcome.is_some() {
            self.phase = Phase::Terminal;
        }
    }

    fn hit(&mut self) {
        self.player.push(self.cards.draw());
        self.settle();
    }

    fn stick(&mut self) {
        self.dealer.reveal_all();
        self.phase = Phase::DealerTurn;
        self.play_dealer();
        self.settle();
    }

    /// Draw dealer cards until the full total passes the dealer limit.
    fn play_dealer(&mut self) {
        while self.dealer.sum() <= self.rules.dealer_limit {
            self.dealer.push(self.cards.draw());
        }
        self.dealer_turn_finished = true;
    }

    /// The player's hand.
    pub fn player_hand(&self) -> &Hand {
        &self.player
    }

    /// The dealer's hand, including face-down cards.
    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer
    }

    /// Best total of the player's hand.
    pub fn player_sum(&self) -> u8 {
        self.player.sum()
    }

    /// Best total of the dealer's face-up cards.
    pub fn dealer_visible_sum(&self) -> u8 {
        self.dealer.visible_sum()
    }

    /// Best total of all dealer cards.
    pub fn dealer_full_sum(&self) -> u8 {
        self.dealer.sum()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the dealer has played out their hand this episode.
    pub fn dealer_turn_finished(&self) -> bool {
        self.dealer_turn_finished
    }

    /// Table rules.
    pub fn rules(&self) -> &TableRules {
        &self.rules
    }

    /// The card source.
    pub fn card_source(&self) -> &C {
        &self.cards
    }
}

impl<C: CardSource> Environment for BlackjackTable<C> {
    type State = BlackjackState;
    type Action = BlackjackAction;

    fn reset(&mut self) -> BlackjackState {
        self.deal();
        self.state()
    }

    fn state(&self) -> BlackjackState {
        BlackjackState {
            player_sum: self.player.sum(),
            dealer_visible_sum: self.dealer.visible_sum(),
            usable_ace: self.player.has_usable_ace(),
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn step(&mut self, action: BlackjackAction) -> Result<Transition<BlackjackState>, StepError> {
        if self.phase == Phase::Terminal {
            return Err(StepError::EpisodeFinished);
        }

        match action {
            BlackjackAction::Hit => self.hit(),
            BlackjackAction::Stick => self.stick(),
        }

        Ok(Transition {
            state: self.state(),
            reward: self.outcome.map_or(0.0, Outcome::reward),
            outcome: self.outcome,
        })
    }
}
