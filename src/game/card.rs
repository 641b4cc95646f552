//! Physical playing cards
//!
//! A card carries its raw face value 1..=13 (ace through king) and a suit.
//! The suit only matters for display and for tracking physical copies in
//! the shoe; scoring uses pip values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four French suits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn symbol(&self) -> char {
        match self {
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
            Suit::Hearts => '♥',
            Suit::Spades => '♠',
        }
    }
}

/// One physical card instance drawn from the shoe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Face value 1..=13: ace = 1, jack/queen/king = 11/12/13
    pub value: u8,
    pub suit: Suit,
}

impl Card {
    pub fn new(value: u8, suit: Suit) -> Self {
        Self { value, suit }
    }

    /// Blackjack pip value: every face card counts ten, aces count one here
    /// (the soft eleven is the hand evaluator's business)
    pub fn pip_value(&self) -> u32 {
        if self.value >= 10 {
            10
        } else {
            u32::from(self.value)
        }
    }

    fn face_label(&self) -> String {
        match self.value {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            v => v.to_string(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face_label(), self.suit.symbol())
    }
}
