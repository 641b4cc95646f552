//! Blackjack table state and orchestration
//!
//! The pure pieces live at the bottom (cards, hands, shoe, participants,
//! table, turn sequencing, settlement arithmetic) and the async engine on
//! top ties them to the chain executor.

pub mod card;
pub mod engine;
pub mod hand;
pub mod participant;
pub mod payout;
pub mod shoe;
pub mod snapshot;
pub mod table;
pub mod turns;

pub use card::{Card, Suit};
pub use engine::{GameEngine, PendingFunds, PendingKind};
pub use hand::Hand;
pub use participant::Participant;
pub use payout::{judge_hand, settlement_return, HandOutcome, RoundSummary};
pub use shoe::Shoe;
pub use snapshot::{Snapshot, SnapshotLog};
pub use table::{CardRecipient, GamePhase, Table};
pub use turns::{advance_turn, state_prompt_chain, TurnAdvance};
