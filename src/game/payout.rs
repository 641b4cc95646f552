//! Round settlement arithmetic
//!
//! Pure judgement and bookkeeping for the payout phase: every hand is
//! compared against the dealer's result computed once up front. The
//! engine drives the chain narration; this module only decides outcomes
//! and amounts.

use super::hand::Hand;
use crate::chains::names;
use crate::config::GameConfig;

/// Outcome of one hand against the dealer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOutcome {
    Busted,
    Win,
    Push,
    Loss,
}

impl HandOutcome {
    /// Result chain fired for this outcome in per-hand mode
    pub fn chain(&self) -> &'static str {
        match self {
            HandOutcome::Busted => names::RESULT_PLAYER_BUSTED,
            HandOutcome::Win => names::RESULT_PLAYER_WIN,
            HandOutcome::Push => names::RESULT_PLAYER_PUSH,
            HandOutcome::Loss => names::RESULT_PLAYER_LOST,
        }
    }
}

/// Judge a hand. A busted hand loses regardless of the dealer; otherwise a
/// dealer bust or a higher score wins, equal scores push.
pub fn judge_hand(hand: &Hand, dealer_best: u32, dealer_bust: bool) -> HandOutcome {
    if hand.bust {
        return HandOutcome::Busted;
    }
    let best = hand.best_score();
    if dealer_bust || best > dealer_best {
        HandOutcome::Win
    } else if best == dealer_best {
        HandOutcome::Push
    } else {
        HandOutcome::Loss
    }
}

/// Amount credited back to the bank for a settled hand. The stake was
/// deducted when the bet was placed, so a win returns stake plus winnings
/// and a push returns the stake; a pushed double-down hand returns the
/// full doubled stake only when the refund flag is set, otherwise the
/// doubled half stays lost.
pub fn settlement_return(hand: &Hand, outcome: HandOutcome, config: &GameConfig) -> i64 {
    match outcome {
        HandOutcome::Busted | HandOutcome::Loss => 0,
        HandOutcome::Win => {
            let multiplier = if hand.natural_blackjack {
                config.blackjack_win_multiplier
            } else if hand.best_score() == 21 {
                config.dirty_blackjack_win_multiplier
            } else {
                config.normal_win_multiplier
            };
            hand.bet + (hand.bet as f32 * multiplier) as i64
        }
        HandOutcome::Push => {
            if hand.double_down && !config.refund_double_down_on_push {
                hand.bet / 2
            } else {
                hand.bet
            }
        }
    }
}

/// Display names grouped by outcome, for the consolidated result message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundSummary {
    pub winners: Vec<String>,
    pub pushed: Vec<String>,
    pub losers: Vec<String>,
    pub busted: Vec<String>,
}

impl RoundSummary {
    pub fn record(&mut self, display_name: &str, outcome: HandOutcome) {
        let bucket = match outcome {
            HandOutcome::Win => &mut self.winners,
            HandOutcome::Push => &mut self.pushed,
            HandOutcome::Loss => &mut self.losers,
            HandOutcome::Busted => &mut self.busted,
        };
        bucket.push(display_name.to_string());
    }

    /// One line covering the whole round, empty groups omitted
    pub fn results_line(&self) -> String {
        let mut parts = Vec::new();
        for (label, group) in [
            ("Win", &self.winners),
            ("Push", &self.pushed),
            ("Lost", &self.losers),
            ("Bust", &self.busted),
        ] {
            if !group.is_empty() {
                parts.push(format!("{}: {}", label, group.join(", ")));
            }
        }
        parts.join(" | ")
    }
}
