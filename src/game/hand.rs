//! Hand state and scoring
//!
//! Scoring returns a minimum total and, when an ace can still count as
//! eleven without busting, a soft maximum. Once a hand stands or busts no
//! further cards arrive through normal play; double-down is the only path
//! that adds exactly one final card after the flag is armed.

use super::card::Card;
use serde::{Deserialize, Serialize};

/// One scoring unit of cards; a participant may hold several via splitting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub cards: Vec<Card>,
    /// Stake riding on this hand; doubled in place by a double-down
    pub bet: i64,
    pub stand: bool,
    pub bust: bool,
    pub double_down: bool,
    pub natural_blackjack: bool,
}

impl Hand {
    pub fn new(bet: i64) -> Self {
        Self {
            bet,
            ..Self::default()
        }
    }

    /// Minimum total and the soft maximum. The soft maximum exists only
    /// when at least one ace is present and counting it as eleven stays
    /// at or under 21.
    pub fn score(&self) -> (u32, Option<u32>) {
        let mut total = 0u32;
        let mut aces = 0u32;
        for card in &self.cards {
            if card.value == 1 {
                total += 1;
                aces += 1;
            } else {
                total += card.pip_value();
            }
        }

        if aces > 0 && total + 10 <= 21 {
            (total, Some(total + 10))
        } else {
            (total, None)
        }
    }

    /// The score the hand is judged by: the soft maximum when it fits,
    /// otherwise the minimum
    pub fn best_score(&self) -> u32 {
        match self.score() {
            (_, Some(soft)) if soft <= 21 => soft,
            (min, _) => min,
        }
    }

    /// True when no interpretation of the hand stays at or under 21
    pub fn is_bust_score(&self) -> bool {
        let (min, soft) = self.score();
        min > 21 && soft.map_or(true, |s| s > 21)
    }

    /// Exactly two cards totalling 21 under either interpretation
    pub fn is_natural_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.best_score() == 21
    }

    /// A resolved hand takes no further part in the turn rotation
    pub fn is_resolved(&self) -> bool {
        self.stand || self.bust || self.natural_blackjack
    }

    /// Space-separated card labels for narration templates
    pub fn cards_label(&self) -> String {
        self.cards
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Points string for narration: "min/soft" while an ace is live,
    /// plain minimum otherwise
    pub fn points_label(&self) -> String {
        match self.score() {
            (min, Some(soft)) => format!("{}/{}", min, soft),
            (min, None) => min.to_string(),
        }
    }
}
