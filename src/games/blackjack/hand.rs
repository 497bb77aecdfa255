//! Hands and hand evaluation.
//!
//! A hand is scored by summing card points with every Ace worth 1, then
//! counting one Ace as 11 when that keeps the total at or below 21.
//!
//! Dealer hands hold one face-down card until the dealer's turn, so there
//! are two sums: the full sum (every card, used to play and settle the hand)
//! and the visible sum (face-up cards only, used for the observed state).
//! Whether an Ace counts as 11 is always decided over the whole hand, so a
//! face-down Ace still lifts the visible sum by 10.

use serde::Serialize;

use crate::games::blackjack::card::Card;

/// Highest total that does not bust.
pub const BLACKJACK: u8 = 21;

/// Extra points for counting one Ace as 11 instead of 1.
const SOFT_BONUS: u8 = 10;

/// A card in a hand together with whether it is face up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DealtCard {
    /// The card.
    pub card: Card,
    /// Whether the card is face up.
    pub visible: bool,
}

/// Ordered cards of one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hand {
    cards: Vec<DealtCard>,
}

impl Hand {
    /// Create an empty hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hand of face-up cards.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut hand = Self::new();
        for card in cards {
            hand.push(card);
        }
        hand
    }

    /// Add a face-up card.
    pub fn push(&mut self, card: Card) {
        self.cards.push(DealtCard { card, visible: true });
    }

    /// Add a face-down card.
    pub fn push_hidden(&mut self, card: Card) {
        self.cards.push(DealtCard { card, visible: false });
    }

    /// Turn every card face up.
    pub fn reveal_all(&mut self) {
        for dealt in &mut self.cards {
            dealt.visible = true;
        }
    }

    /// Remove all cards.
    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Cards in the order they were dealt.
    pub fn cards(&self) -> &[DealtCard] {
        &self.cards
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the hand holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Whether any card is still face down.
    pub fn has_hidden(&self) -> bool {
        self.cards.iter().any(|dealt| !dealt.visible)
    }

    /// Best total over every card.
    pub fn sum(&self) -> u8 {
        hand_sum(self, false)
    }

    /// Best total over the face-up cards.
    pub fn visible_sum(&self) -> u8 {
        hand_sum(self, true)
    }

    /// Whether an Ace in the hand can count as 11.
    pub fn has_usable_ace(&self) -> bool {
        has_usable_ace(self)
    }
}

/// Raw total (Aces as 1) and Ace presence over the selected cards.
fn raw_total<'a>(cards: impl Iterator<Item = &'a DealtCard>) -> (u8, bool) {
    cards.fold((0u8, false), |(total, ace), dealt| {
        (total + dealt.card.score(), ace || dealt.card.is_ace())
    })
}

fn is_soft(raw: u8, has_ace: bool) -> bool {
    has_ace && raw + SOFT_BONUS <= BLACKJACK
}

/// True iff the hand holds an Ace and counting it as 11 keeps the total
/// at or below 21.
pub fn has_usable_ace(hand: &Hand) -> bool {
    let (raw, has_ace) = raw_total(hand.cards.iter());
    is_soft(raw, has_ace)
}

/// Best total of a hand.
///
/// With `visible_only`, face-down cards are left out of the raw total, but
/// the usable-Ace bonus is still decided by [`has_usable_ace`] over every
/// card. A selection with no cards sums to 0.
pub fn hand_sum(hand: &Hand, visible_only: bool) -> u8 {
    let mut selected = hand
        .cards
        .iter()
        .filter(|dealt| !visible_only || dealt.visible)
        .peekable();
    if selected.peek().is_none() {
        return 0;
    }

    let (raw, _) = raw_total(selected);
    if has_usable_ace(hand) {
        raw + SOFT_BONUS
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(ranks: &[u8]) -> Hand {
        Hand::from_cards(ranks.iter().map(|&r| Card::new(r).unwrap()))
    }

    #[test]
    fn test_single_ace_with_low_cards_is_usable() {
        for ranks in [&[1, 2][..], &[1, 9], &[3, 1, 4], &[1, 2, 3, 4]] {
            let h = hand(ranks);
            let raw: u8 = ranks.iter().map(|&r| r.min(10)).sum();
            assert!(h.has_usable_ace(), "{:?} should have a usable ace", ranks);
            assert_eq!(h.sum(), raw + 10);
        }
    }

    #[test]
    fn test_ace_that_would_bust_is_not_usable() {
        for ranks in [&[1, 5, 6][..], &[1, 13, 12], &[9, 1, 2, 8]] {
            let h = hand(ranks);
            let raw: u8 = ranks.iter().map(|&r| r.min(10)).sum();
            assert!(!h.has_usable_ace(), "{:?} should not have a usable ace", ranks);
            assert_eq!(h.sum(), raw);
        }
    }

    #[test]
    fn test_ace_with_ten_is_twenty_one() {
        assert_eq!(hand(&[1, 13]).sum(), 21);
        assert_eq!(hand(&[1, 10]).sum(), 21);
    }

    #[test]
    fn test_two_aces_count_one_as_eleven() {
        let h = hand(&[1, 1]);
        assert!(h.has_usable_ace());
        assert_eq!(h.sum(), 12);
    }

    #[test]
    fn test_face_cards_score_ten() {
        assert_eq!(hand(&[11, 12]).sum(), 20);
        assert_eq!(hand(&[13, 5, 7]).sum(), 22);
    }

    #[test]
    fn test_visible_sum_ignores_hidden_cards() {
        let mut dealer = Hand::new();
        dealer.push(Card::new(6).unwrap());
        dealer.push_hidden(Card::new(10).unwrap());

        assert_eq!(dealer.visible_sum(), 6);
        assert_eq!(dealer.sum(), 16);
        assert!(dealer.has_hidden());

        dealer.reveal_all();
        assert_eq!(dealer.visible_sum(), 16);
        assert!(!dealer.has_hidden());
    }

    #[test]
    fn test_hidden_ace_lifts_visible_sum() {
        let mut dealer = Hand::new();
        dealer.push(Card::new(6).unwrap());
        dealer.push_hidden(Card::new(1).unwrap());

        assert!(dealer.has_usable_ace());
        assert_eq!(dealer.visible_sum(), 16);
        assert_eq!(dealer.sum(), 17);
    }

    #[test]
    fn test_hidden_ace_that_would_bust_adds_nothing() {
        let mut dealer = Hand::new();
        dealer.push(Card::new(6).unwrap());
        dealer.push_hidden(Card::new(1).unwrap());
        dealer.push(Card::new(9).unwrap());

        assert!(!dealer.has_usable_ace());
        assert_eq!(dealer.visible_sum(), 15);
        assert_eq!(dealer.sum(), 16);
    }

    #[test]
    fn test_visible_ace_alone_counts_eleven() {
        let mut dealer = Hand::new();
        dealer.push(Card::new(1).unwrap());
        dealer.push_hidden(Card::new(9).unwrap());
        assert_eq!(dealer.visible_sum(), 11);
        assert_eq!(dealer.sum(), 20);
    }

    #[test]
    fn test_empty_hand_sums_to_zero() {
        assert_eq!(Hand::new().sum(), 0);

        let mut dealer = Hand::new();
        dealer.push_hidden(Card::new(4).unwrap());
        assert_eq!(hand_sum(&dealer, true), 0);

        let mut dealer = Hand::new();
        dealer.push_hidden(Card::new(1).unwrap());
        assert_eq!(hand_sum(&dealer, true), 0);
    }
}
