//! Turn sequencing
//!
//! `advance_turn` moves the rotation forward over a table and reports what
//! the engine must do next as an explicit effect, which keeps the sequencer
//! a pure function over table state and makes it testable without any
//! executor attached.
//!
//! The rotation rules, in order: during the initial deal either walk the
//! undelt participants (deal-first mode) or hand play over immediately;
//! afterwards walk the current participant's remaining hands, skip hands
//! that already resolved, then walk the remaining eligible participants in
//! seating order; when the rotation runs dry, re-activate the bench once;
//! finally either skip straight to payout (everyone busted) or open the
//! dealer's turn.

use super::participant::Participant;
use super::table::{GamePhase, Table};
use crate::chains::names;
use crate::config::GameConfig;
use tracing::debug;

/// What the engine must do after the sequencer moved the turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAdvance {
    /// A new participant/hand is current. The state prompt fires only when
    /// the now-current hand already holds two cards, i.e. not on the very
    /// first deal.
    Switched { index: usize, fire_prompt: bool },
    /// Rotation exhausted with at least one live hand; dealer plays
    DealerTurn,
    /// Every hand across the rotation is bust; dealer turn is skipped
    AllBustPayout,
    /// Nothing to do
    Idle,
}

/// Advance the rotation. Mutates phase, turn flags and hand indexes;
/// repeated calls never re-select a participant whose every hand is
/// already resolved.
pub fn advance_turn(table: &mut Table, config: &GameConfig) -> TurnAdvance {
    let eligible = table.eligible();
    let bench = table.bench();

    if eligible.is_empty() && bench.is_empty() {
        table.phase = GamePhase::Waiting;
        return TurnAdvance::Idle;
    }

    if table.phase == GamePhase::InitialDeal {
        return advance_initial_deal(table, config, &eligible);
    }

    // Walk the current participant's remaining hands first.
    if let Some(current) = table.current_turn_index() {
        let participant = &mut table.participants[current];
        participant.current_hand_index += 1;
        if participant.current_hand_index < participant.hands.len() {
            if participant.hands[participant.current_hand_index].is_resolved() {
                return advance_turn(table, config);
            }
            return TurnAdvance::Switched {
                index: current,
                fire_prompt: false,
            };
        }
        participant.current_hand_index = 0;
        participant.is_current_turn = false;

        let position = eligible.iter().position(|&idx| idx == current);
        let next_position = position.map_or(0, |p| p + 1);
        if let Some(&next) = eligible.get(next_position) {
            table.participants[next].is_current_turn = true;
            if table.participants[next].is_finished() {
                return advance_turn(table, config);
            }
            return switch_turn_to(table, next);
        }
    } else if let Some(&first) = eligible.first() {
        table.participants[first].is_current_turn = true;
        if table.participants[first].is_finished() {
            return advance_turn(table, config);
        }
        return switch_turn_to(table, first);
    }

    // Rotation ran dry: give the bench one shot at the round.
    if !bench.is_empty() {
        table.activate_bench();
        let returning = table
            .participants
            .iter()
            .position(|p| p.is_eligible() && p.was_on_hold_this_round);
        if let Some(idx) = returning {
            debug!(
                participant = table.participants[idx].display_name(),
                "bench re-entering rotation"
            );
            table.participants[idx].is_current_turn = true;
            if table.participants[idx].is_finished() {
                return advance_turn(table, config);
            }
            return switch_turn_to(table, idx);
        }
    }

    let any_alive = table
        .participants
        .iter()
        .filter(|p| p.is_eligible())
        .any(|p| p.hands.iter().any(|h| !h.bust));

    if !any_alive {
        debug!("every hand busted, skipping dealer turn");
        table.phase = GamePhase::Payout;
        return TurnAdvance::AllBustPayout;
    }

    table.phase = GamePhase::DealerTurn;
    table.selected_target = Some(table.dealer.name.clone());
    TurnAdvance::DealerTurn
}

fn advance_initial_deal(
    table: &mut Table,
    config: &GameConfig,
    eligible: &[usize],
) -> TurnAdvance {
    if config.first_deal_then_play {
        let undealt = eligible
            .iter()
            .copied()
            .find(|&idx| !table.participants[idx].initial_hand_dealt);
        if let Some(idx) = undealt {
            return switch_turn_to(table, idx);
        }

        table.phase = GamePhase::PlayersTurn;
        for &idx in eligible {
            table.participants[idx].is_current_turn = false;
        }
        let Some(&first) = eligible.first() else {
            return TurnAdvance::Idle;
        };
        table.participants[first].is_current_turn = true;
        if table.participants[first].is_finished() {
            return advance_turn(table, config);
        }
        return switch_turn_to(table, first);
    }

    // Per-participant immediate play: the current participant keeps the
    // turn and plays the hand they were just dealt.
    table.phase = GamePhase::PlayersTurn;
    if let Some(current) = table.current_turn_index() {
        if table.participants[current].is_finished() {
            return advance_turn(table, config);
        }
    }
    TurnAdvance::Idle
}

fn switch_turn_to(table: &mut Table, index: usize) -> TurnAdvance {
    for p in table.participants.iter_mut() {
        p.is_current_turn = false;
    }
    let participant = &mut table.participants[index];
    participant.is_current_turn = true;
    participant.current_hand_index = 0;
    let fire_prompt = participant
        .hands
        .first()
        .map_or(false, |h| h.cards.len() >= 2);
    table.selected_target = Some(table.participants[index].name.clone());
    TurnAdvance::Switched { index, fire_prompt }
}

/// Select the state prompt chain for the hand currently being played:
/// hit/stand always, plus double-down and split when the hand qualifies
pub fn state_prompt_chain(participant: &Participant, config: &GameConfig) -> Option<&'static str> {
    let hand = participant.current_hand()?;

    let mut can_split = false;
    if hand.cards.len() == 2 && participant.hands.len() < config.max_hands_per_participant {
        can_split = if config.identical_split_only {
            hand.cards[0].value == hand.cards[1].value
        } else {
            hand.cards[0].pip_value() == hand.cards[1].pip_value()
        };
    }

    let is_split_hand = participant.hands.len() > 1;
    let mut can_double = hand.cards.len() == 2;
    if is_split_hand && !config.allow_double_down_after_split {
        can_double = false;
    }

    Some(if can_split {
        names::STATE_HSDS
    } else if can_double {
        names::STATE_HSD
    } else {
        names::STATE_HS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Card, Suit};
    use crate::game::hand::Hand;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    fn seated(names: &[&str]) -> Table {
        let mut table = Table::new("Croupier", 1);
        for name in names {
            let mut p = Participant::new(*name);
            p.current_bet = 100;
            table.participants.push(p);
        }
        table
    }

    fn dealt_hand(cards: &[u8]) -> Hand {
        let mut hand = Hand::new(100);
        for &value in cards {
            hand.cards.push(Card::new(value, Suit::Hearts));
        }
        hand
    }

    #[test]
    fn deal_first_walks_undealt_participants() {
        let mut table = seated(&["Ann", "Bert"]);
        table.phase = GamePhase::InitialDeal;

        let advance = advance_turn(&mut table, &config());
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 0,
                fire_prompt: false
            }
        );

        table.participants[0].initial_hand_dealt = true;
        let advance = advance_turn(&mut table, &config());
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 1,
                fire_prompt: false
            }
        );
        assert_eq!(table.phase, GamePhase::InitialDeal);
    }

    #[test]
    fn deal_first_opens_play_once_everyone_is_dealt() {
        let mut table = seated(&["Ann", "Bert"]);
        table.phase = GamePhase::InitialDeal;
        for p in table.participants.iter_mut() {
            p.initial_hand_dealt = true;
            p.hands.push(dealt_hand(&[10, 5]));
        }

        let advance = advance_turn(&mut table, &config());
        assert_eq!(table.phase, GamePhase::PlayersTurn);
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 0,
                fire_prompt: true
            }
        );
        assert!(table.participants[0].is_current_turn);
    }

    #[test]
    fn split_hands_play_in_order_and_resolved_hands_are_skipped() {
        let mut table = seated(&["Ann", "Bert"]);
        table.phase = GamePhase::PlayersTurn;
        table.participants[0].is_current_turn = true;
        table.participants[0].hands.push(dealt_hand(&[8, 8]));
        table.participants[0].hands.push(dealt_hand(&[8, 3]));
        table.participants[1].hands.push(dealt_hand(&[10, 6]));

        // Second hand is live: same participant stays current on hand 1.
        let advance = advance_turn(&mut table, &config());
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 0,
                fire_prompt: false
            }
        );
        assert_eq!(table.participants[0].current_hand_index, 1);

        // Once the second hand resolves, the turn moves to Bert.
        table.participants[0].current_hand_index = 0;
        table.participants[0].hands[1].stand = true;
        table.participants[0].hands[0].stand = true;
        let advance = advance_turn(&mut table, &config());
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 1,
                fire_prompt: true
            }
        );
    }

    #[test]
    fn never_reselects_fully_resolved_participants() {
        let mut table = seated(&["Ann", "Bert", "Cleo"]);
        table.phase = GamePhase::PlayersTurn;
        table.participants[0].is_current_turn = true;
        table.participants[0].hands.push(dealt_hand(&[10, 10]));
        table.participants[0].hands[0].stand = true;
        table.participants[1].hands.push(dealt_hand(&[10, 10]));
        table.participants[1].hands[0].stand = true;
        table.participants[2].hands.push(dealt_hand(&[10, 6]));

        let advance = advance_turn(&mut table, &config());
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 2,
                fire_prompt: true
            }
        );
    }

    #[test]
    fn bench_reactivates_before_dealer_turn() {
        let mut table = seated(&["Ann", "Bert"]);
        table.phase = GamePhase::PlayersTurn;
        table.participants[0].is_current_turn = true;
        table.participants[0].hands.push(dealt_hand(&[10, 9]));
        table.participants[0].hands[0].stand = true;
        table.participants[1].on_bench = true;
        table.participants[1].was_on_hold_this_round = true;
        table.participants[1].hands.push(dealt_hand(&[10, 6]));

        let advance = advance_turn(&mut table, &config());
        assert_eq!(
            advance,
            TurnAdvance::Switched {
                index: 1,
                fire_prompt: true
            }
        );
        assert!(!table.participants[1].on_bench);
    }

    #[test]
    fn all_bust_skips_the_dealer() {
        let mut table = seated(&["Ann", "Bert"]);
        table.phase = GamePhase::PlayersTurn;
        table.participants[0].is_current_turn = true;
        for p in table.participants.iter_mut() {
            let mut hand = dealt_hand(&[10, 10, 5]);
            hand.bust = true;
            hand.stand = true;
            p.hands.push(hand);
        }

        let advance = advance_turn(&mut table, &config());
        assert_eq!(advance, TurnAdvance::AllBustPayout);
        assert_eq!(table.phase, GamePhase::Payout);
    }

    #[test]
    fn live_hand_hands_over_to_the_dealer() {
        let mut table = seated(&["Ann"]);
        table.phase = GamePhase::PlayersTurn;
        table.participants[0].is_current_turn = true;
        let mut hand = dealt_hand(&[10, 9]);
        hand.stand = true;
        table.participants[0].hands.push(hand);

        let advance = advance_turn(&mut table, &config());
        assert_eq!(advance, TurnAdvance::DealerTurn);
        assert_eq!(table.phase, GamePhase::DealerTurn);
    }

    #[test]
    fn empty_rotation_goes_back_to_waiting() {
        let mut table = seated(&[]);
        table.phase = GamePhase::PlayersTurn;
        let advance = advance_turn(&mut table, &config());
        assert_eq!(advance, TurnAdvance::Idle);
        assert_eq!(table.phase, GamePhase::Waiting);
    }

    #[test]
    fn prompt_selection_honours_split_and_double_rules() {
        let mut config = config();
        let mut p = Participant::new("Ann");
        p.hands.push(dealt_hand(&[8, 8]));
        assert_eq!(state_prompt_chain(&p, &config), Some(names::STATE_HSDS));

        // King + ten only splits when pip-equal splitting is allowed.
        p.hands[0] = dealt_hand(&[13, 10]);
        assert_eq!(state_prompt_chain(&p, &config), Some(names::STATE_HSD));
        config.identical_split_only = false;
        assert_eq!(state_prompt_chain(&p, &config), Some(names::STATE_HSDS));

        // Three cards: no split, no double.
        p.hands[0] = dealt_hand(&[2, 3, 4]);
        assert_eq!(state_prompt_chain(&p, &config), Some(names::STATE_HS));
    }

    #[test]
    fn split_hand_cannot_double_unless_allowed() {
        let mut config = config();
        config.max_hands_per_participant = 2;
        let mut p = Participant::new("Ann");
        p.hands.push(dealt_hand(&[9, 5]));
        p.hands.push(dealt_hand(&[9, 2]));

        assert_eq!(state_prompt_chain(&p, &config), Some(names::STATE_HS));
        config.allow_double_down_after_split = true;
        assert_eq!(state_prompt_chain(&p, &config), Some(names::STATE_HSD));
    }
}
