use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Card rank. Ordinal values double as comparison values: `Ace` is high
/// (14) everywhere except the wheel straight, where it is also low (1) —
/// [`crate::hand`] handles that case explicitly rather than here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.value() == value)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        };
        write!(f, "{c}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
            Suit::Spades => 's',
        };
        write!(f, "{c}")
    }
}

/// An immutable playing card. Once dealt, a `Card` is never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCardError;

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a 2-character card literal like \"As\" or \"Td\"")
    }
}

impl std::error::Error for ParseCardError {}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseCardError);
        }
        let rank = match bytes[0] {
            b'2' => Rank::Two,
            b'3' => Rank::Three,
            b'4' => Rank::Four,
            b'5' => Rank::Five,
            b'6' => Rank::Six,
            b'7' => Rank::Seven,
            b'8' => Rank::Eight,
            b'9' => Rank::Nine,
            b'T' | b't' => Rank::Ten,
            b'J' | b'j' => Rank::Jack,
            b'Q' | b'q' => Rank::Queen,
            b'K' | b'k' => Rank::King,
            b'A' | b'a' => Rank::Ace,
            _ => return Err(ParseCardError),
        };
        let suit = match bytes[1] {
            b'h' | b'H' => Suit::Hearts,
            b'd' | b'D' => Suit::Diamonds,
            b'c' | b'C' => Suit::Clubs,
            b's' | b'S' => Suit::Spades,
            _ => return Err(ParseCardError),
        };
        Ok(Card { rank, suit })
    }
}

/// The 52-card universe, dealt sequentially from the end. The deck does not
/// model burns semantically — a burn is just a deal whose result the
/// caller discards.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A freshly ordered, unshuffled 52-card deck.
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(52);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Test-only / deterministic-replay constructor: deals proceed by
    /// popping from the end of `cards`, so list them in reverse deal order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Resets to a fresh ordered 52-card deck, discarding any deal progress.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fisher-Yates shuffle over an injected RNG. Production callers should
    /// pass a cryptographic source (e.g. `rand::rngs::OsRng`) seeded fresh
    /// per hand; tests pass a seeded `StdRng` for reproducibility.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
    }

    pub fn deal_one(&mut self) -> EngineResult<Card> {
        self.cards.pop().ok_or(EngineError::EmptyDeck)
    }

    pub fn deal_many(&mut self, n: usize) -> EngineResult<Vec<Card>> {
        (0..n).map(|_| self.deal_one()).collect()
    }

    pub fn remaining_count(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deck_has_52_unique_cards() {
        let deck = Deck::new();
        assert_eq!(deck.remaining_count(), 52);
        let unique: std::collections::HashSet<_> = deck.cards.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn card_display_round_trips_through_from_str() {
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                let card = Card::new(rank, suit);
                let s = card.to_string();
                let parsed: Card = s.parse().unwrap();
                assert_eq!(parsed.to_string(), s);
            }
        }
    }

    #[test]
    fn deal_from_empty_deck_is_an_invariant_violation() {
        let mut deck = Deck::from_cards(vec![]);
        assert_eq!(deck.deal_one(), Err(EngineError::EmptyDeck));
    }

    #[test]
    fn seeded_shuffle_is_deterministic() {
        use rand::{rngs::StdRng, SeedableRng};
        let mut a = Deck::new();
        let mut b = Deck::new();
        a.shuffle(&mut StdRng::seed_from_u64(42));
        b.shuffle(&mut StdRng::seed_from_u64(42));
        let dealt_a: Vec<_> = (0..10).map(|_| a.deal_one().unwrap()).collect();
        let dealt_b: Vec<_> = (0..10).map(|_| b.deal_one().unwrap()).collect();
        assert_eq!(dealt_a, dealt_b);
    }

    #[test]
    fn deal_many_matches_sequential_deal_one() {
        let mut a = Deck::new();
        let mut b = a.clone();
        let many = a.deal_many(5).unwrap();
        let one: Vec<_> = (0..5).map(|_| b.deal_one().unwrap()).collect();
        assert_eq!(many, one);
    }
}
