//! Multi-deck shoe
//!
//! The shoe is a bag of physical card copies. Draws request a face value
//! (the external dice roll decides the value, the shoe decides which
//! physical copy leaves the bag). Pulling a value that is exhausted
//! triggers a full reshuffle before retry, so a pull never starves.

use super::card::{Card, Suit};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shoe {
    decks: usize,
    cards: Vec<Card>,
}

impl Shoe {
    pub fn new(decks: usize) -> Self {
        let mut shoe = Self {
            decks: decks.max(1),
            cards: Vec::new(),
        };
        shoe.reshuffle();
        shoe
    }

    /// Refill with `decks` full 52-card decks
    pub fn reshuffle(&mut self) {
        self.cards.clear();
        for _ in 0..self.decks {
            for suit in Suit::ALL {
                for value in 1..=13 {
                    self.cards.push(Card::new(value, suit));
                }
            }
        }
        debug!(decks = self.decks, "shoe reshuffled");
    }

    /// Draw a physical card of the requested face value, uniformly among the
    /// remaining copies. Values outside 1..=13 are clamped rather than
    /// rejected; the draw source is not trusted to be well-formed.
    pub fn pull(&mut self, value: u8) -> Card {
        let value = value.clamp(1, 13);

        let mut matches: Vec<usize> = self.matching_indexes(value);
        if matches.is_empty() {
            self.reshuffle();
            matches = self.matching_indexes(value);
        }

        let pick = matches[rand::thread_rng().gen_range(0..matches.len())];
        self.cards.swap_remove(pick)
    }

    fn matching_indexes(&self, value: u8) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.value == value)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Verbatim copy of the remaining cards, for snapshots
    pub fn snapshot(&self) -> Vec<Card> {
        self.cards.clone()
    }

    /// Replace the shoe contents verbatim, for undo
    pub fn restore(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }
}
