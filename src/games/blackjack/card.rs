//! Card representation and card sources.
//!
//! Cards are drawn with replacement from an infinite source: every rank
//! 1..=13 is equally likely on every draw.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Rank of an Ace.
pub const ACE: u8 = 1;
/// Highest rank (King).
pub const KING: u8 = 13;

/// Rank characters for display, indexed by `rank - 1`.
const RANK_NAMES: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];

/// A single playing card.
///
/// The rank keeps the card's identity (11, 12, 13 for J, Q, K); scoring uses
/// [`Card::score`], which caps face cards at 10.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Card {
    /// 1 = Ace, 2-10 = pip cards, 11-13 = Jack, Queen, King.
    rank: u8,
}

impl Card {
    /// Create a card from its rank (1-13).
    pub fn new(rank: u8) -> Option<Self> {
        (ACE..=KING).contains(&rank).then_some(Self { rank })
    }

    /// Rank of the card (1-13).
    #[inline]
    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Points of the card with an Ace counted as 1.
    #[inline]
    pub fn score(self) -> u8 {
        self.rank.min(10)
    }

    /// Check if this card is an Ace.
    #[inline]
    pub fn is_ace(self) -> bool {
        self.rank == ACE
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", RANK_NAMES[(self.rank - 1) as usize])
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Card({})", self)
    }
}

/// Where new cards come from.
pub trait CardSource {
    /// Draw the next card.
    fn draw(&mut self) -> Card;
}

/// Uniform random ranks from a seedable generator.
#[derive(Debug, Clone)]
pub struct UniformCards {
    rng: StdRng,
}

impl UniformCards {
    /// Create a source, seeded if `seed` is set and from entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self {
                rng: StdRng::from_entropy(),
            },
        }
    }

    /// Create a reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CardSource for UniformCards {
    fn draw(&mut self) -> Card {
        Card {
            rank: self.rng.gen_range(ACE..=KING),
        }
    }
}

/// A fixed sequence of cards, repeated from the start once used up.
#[derive(Debug, Clone)]
pub struct ScriptedCards {
    cards: Vec<Card>,
    next: usize,
}

impl ScriptedCards {
    /// Create a source from ranks. Returns `None` if the list is empty or
    /// holds a rank outside 1-13.
    pub fn from_ranks(ranks: &[u8]) -> Option<Self> {
        let cards = ranks.iter().map(|&rank| Card::new(rank)).collect::<Option<Vec<_>>>()?;
        if cards.is_empty() {
            return None;
        }
        Some(Self { cards, next: 0 })
    }

    /// Number of cards drawn so far.
    pub fn drawn(&self) -> usize {
        self.next
    }
}

impl CardSource for ScriptedCards {
    fn draw(&mut self) -> Card {
        let card = self.cards[self.next % self.cards.len()];
        self.next += 1;
        card
    }
}
