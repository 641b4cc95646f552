//! Table state and card-recipient resolution
//!
//! The table is an explicit handle passed to every engine operation; there
//! is no ambient global state. One table runs one round at a time.

use super::participant::Participant;
use super::shoe::Shoe;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Waiting,
    InitialDeal,
    PlayersTurn,
    DealerTurn,
    Payout,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Waiting => "Waiting",
            GamePhase::InitialDeal => "InitialDeal",
            GamePhase::PlayersTurn => "PlayersTurn",
            GamePhase::DealerTurn => "DealerTurn",
            GamePhase::Payout => "Payout",
        };
        f.write_str(name)
    }
}

/// Which table occupant a drawn card lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRecipient {
    Dealer,
    Participant(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub phase: GamePhase,
    pub dealer: Participant,
    pub participants: Vec<Participant>,
    pub shoe: Shoe,
    /// Explicit override of where the next drawn card lands; armed around
    /// deal chains so stray selections cannot misroute cards
    pub forced_recipient: Option<String>,
    /// Externally observed selection, e.g. the host's targeted player
    pub selected_target: Option<String>,
}

impl Table {
    pub fn new(dealer_name: impl Into<String>, decks: usize) -> Self {
        Self {
            phase: GamePhase::Waiting,
            dealer: Participant::new(dealer_name),
            participants: Vec::new(),
            shoe: Shoe::new(decks),
            forced_recipient: None,
            selected_target: None,
        }
    }

    /// Indexes of participants in the active rotation, in seating order
    pub fn eligible(&self) -> Vec<usize> {
        self.participants
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_eligible())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Indexes of active participants currently parked on the bench
    pub fn bench(&self) -> Vec<usize> {
        self.participants
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active && p.on_bench)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn current_turn_index(&self) -> Option<usize> {
        self.participants.iter().position(|p| p.is_current_turn)
    }

    /// Case-insensitive lookup by real name or alias
    pub fn participant_by_name(&self, name: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.answers_to(name))
    }

    pub fn is_dealer_name(&self, name: &str) -> bool {
        self.dealer.answers_to(name)
    }

    pub fn participant(&self, recipient: CardRecipient) -> &Participant {
        match recipient {
            CardRecipient::Dealer => &self.dealer,
            CardRecipient::Participant(idx) => &self.participants[idx],
        }
    }

    pub fn participant_mut(&mut self, recipient: CardRecipient) -> &mut Participant {
        match recipient {
            CardRecipient::Dealer => &mut self.dealer,
            CardRecipient::Participant(idx) => &mut self.participants[idx],
        }
    }

    /// Resolve where an observed card lands. Three explicit tiers: the
    /// forced override wins, then the identity carried by the draw event,
    /// then the externally observed selection, then whoever holds the
    /// turn, and finally the dealer. Names that match nobody fall through
    /// to the next tier.
    pub fn resolve_card_recipient(&self, hint: Option<&str>) -> CardRecipient {
        let named_tiers = [
            self.forced_recipient.as_deref(),
            hint,
            self.selected_target.as_deref(),
        ];

        for name in named_tiers.into_iter().flatten() {
            if name.trim().is_empty() {
                continue;
            }
            if self.is_dealer_name(name) {
                return CardRecipient::Dealer;
            }
            if let Some(idx) = self.participant_by_name(name) {
                return CardRecipient::Participant(idx);
            }
        }

        if let Some(idx) = self.current_turn_index() {
            return CardRecipient::Participant(idx);
        }
        CardRecipient::Dealer
    }

    /// Return every benched participant to the rotation
    pub fn activate_bench(&mut self) {
        for p in self.participants.iter_mut() {
            if p.active && p.on_bench {
                p.on_bench = false;
            }
        }
    }
}
