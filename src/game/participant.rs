//! Participant state
//!
//! A participant owns an ordered list of hands (several after splitting)
//! and the index of the hand currently being played. The index is always
//! kept valid while hands exist; out-of-range values are repaired by
//! clamping, never treated as fatal.

use super::hand::Hand;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Optional table nickname; display prefers it over the real name
    pub alias: String,
    /// Seated and playing this session
    pub active: bool,
    /// Temporarily excluded from the rotation by the host
    pub on_hold: bool,
    /// Parked until the rotation runs dry, then re-activated as a group
    pub on_bench: bool,
    /// Set when benched; a benched participant re-enters at most once per round
    pub was_on_hold_this_round: bool,
    pub is_current_turn: bool,
    pub initial_hand_dealt: bool,
    pub bank: i64,
    pub current_bet: i64,
    pub hands: Vec<Hand>,
    pub current_hand_index: usize,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            active: true,
            on_hold: false,
            on_bench: false,
            was_on_hold_this_round: false,
            is_current_turn: false,
            initial_hand_dealt: false,
            bank: 0,
            current_bet: 0,
            hands: Vec::new(),
            current_hand_index: 0,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.alias.trim().is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Eligible for the turn rotation right now
    pub fn is_eligible(&self) -> bool {
        self.active && !self.on_hold && !self.on_bench
    }

    /// Repair an out-of-range hand index by clamping to 0
    pub fn clamp_hand_index(&mut self) {
        if self.current_hand_index >= self.hands.len() {
            self.current_hand_index = 0;
        }
    }

    pub fn current_hand(&self) -> Option<&Hand> {
        self.hands.get(self.current_hand_index)
    }

    pub fn current_hand_mut(&mut self) -> Option<&mut Hand> {
        self.hands.get_mut(self.current_hand_index)
    }

    /// Best score of the hand currently being played, zero without hands
    pub fn best_score(&self) -> u32 {
        self.current_hand().map_or(0, Hand::best_score)
    }

    /// Every hand stood, busted, or holds a natural; nothing left to play
    pub fn is_finished(&self) -> bool {
        !self.hands.is_empty() && self.hands.iter().all(Hand::is_resolved)
    }

    /// Fresh single hand carrying the current bet, turn and deal flags cleared
    pub fn reset_for_new_round(&mut self) {
        self.hands.clear();
        self.hands.push(Hand::new(self.current_bet));
        self.current_hand_index = 0;
        self.is_current_turn = false;
        self.initial_hand_dealt = false;
        self.was_on_hold_this_round = false;
    }

    /// Case-insensitive match against real name or alias
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.alias.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Card, Suit};

    #[test]
    fn display_prefers_alias() {
        let mut p = Participant::new("Astrid Vel");
        assert_eq!(p.display_name(), "Astrid Vel");
        p.alias = "Asti".to_string();
        assert_eq!(p.display_name(), "Asti");
    }

    #[test]
    fn clamp_repairs_invalid_index() {
        let mut p = Participant::new("x");
        p.hands.push(Hand::new(50));
        p.current_hand_index = 7;
        p.clamp_hand_index();
        assert_eq!(p.current_hand_index, 0);
        assert!(p.current_hand().is_some());
    }

    #[test]
    fn reset_leaves_one_hand_with_current_bet() {
        let mut p = Participant::new("x");
        p.current_bet = 250;
        p.hands.push(Hand::new(50));
        p.hands.push(Hand::new(50));
        p.is_current_turn = true;
        p.initial_hand_dealt = true;

        p.reset_for_new_round();
        assert_eq!(p.hands.len(), 1);
        assert_eq!(p.hands[0].bet, 250);
        assert!(!p.is_current_turn);
        assert!(!p.initial_hand_dealt);
    }

    #[test]
    fn finished_requires_every_hand_resolved() {
        let mut p = Participant::new("x");
        assert!(!p.is_finished());

        p.hands.push(Hand::new(10));
        p.hands.push(Hand::new(10));
        p.hands[0].stand = true;
        assert!(!p.is_finished());

        p.hands[1].bust = true;
        assert!(p.is_finished());
    }

    #[test]
    fn best_score_tracks_current_hand() {
        let mut p = Participant::new("x");
        p.hands.push(Hand::new(10));
        p.hands.push(Hand::new(10));
        p.hands[0].cards.push(Card::new(10, Suit::Clubs));
        p.hands[1].cards.push(Card::new(5, Suit::Clubs));

        assert_eq!(p.best_score(), 10);
        p.current_hand_index = 1;
        assert_eq!(p.best_score(), 5);
    }
}
