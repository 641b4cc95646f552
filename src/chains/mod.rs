//! Command chains and collaborator seams
//!
//! A chain is a named, ordered script of narration steps driving the chat
//! channel; the catalog maps chain names to steps and is external
//! configuration the engine only reads. The traits here are the engine's
//! seams to its host: text delivery, template resolution and session
//! persistence all stay behind them.

pub mod executor;
pub mod store;
pub mod vars;

use crate::error::Result;
use crate::game::table::Table;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use executor::{ChainControl, ChainExecutor};
pub use store::{JsonFileStore, NullStore};
pub use vars::{TokenResolver, VariableStore};

/// Chain names the engine fires. The catalog may carry more; these must
/// exist for the table to narrate a full round.
pub mod names {
    pub const INITIAL: &str = "Initial";
    pub const HIT: &str = "Hit";
    pub const STAND: &str = "Stand";
    pub const DD: &str = "DD";
    pub const SPLIT: &str = "Split";
    pub const PLAYER_BJ: &str = "PlayerBJ";
    pub const PLAYER_DIRTY_BJ: &str = "PlayerDirtyBJ";
    pub const PLAYER_BUST: &str = "PlayerBust";
    pub const PLAYER_DD_FORCED_STAND: &str = "PlayerDDForcedStand";
    pub const DEAL_START: &str = "DealStart";
    pub const DEAL_HIT: &str = "DealHit";
    pub const DEAL_STAND: &str = "DealStand";
    pub const DEALER_BJ: &str = "DealerBJ";
    pub const DEALER_BUST: &str = "DealerBust";
    pub const RESULT_PLAYER_WIN: &str = "ResultPlayerWin";
    pub const RESULT_PLAYER_PUSH: &str = "ResultPlayerPush";
    pub const RESULT_PLAYER_BUSTED: &str = "ResultPlayerBusted";
    pub const RESULT_PLAYER_LOST: &str = "ResultPlayerLost";
    pub const RESULT_SMALL: &str = "ResultSmall";
    pub const STATE_HS: &str = "StateHS";
    pub const STATE_HSD: &str = "StateHSD";
    pub const STATE_HSDS: &str = "StateHSDS";

    pub const REQUIRED: [&str; 22] = [
        INITIAL,
        HIT,
        STAND,
        DD,
        SPLIT,
        PLAYER_BJ,
        PLAYER_DIRTY_BJ,
        PLAYER_BUST,
        PLAYER_DD_FORCED_STAND,
        DEAL_START,
        DEAL_HIT,
        DEAL_STAND,
        DEALER_BJ,
        DEALER_BUST,
        RESULT_PLAYER_WIN,
        RESULT_PLAYER_PUSH,
        RESULT_PLAYER_BUSTED,
        RESULT_PLAYER_LOST,
        RESULT_SMALL,
        STATE_HS,
        STATE_HSD,
        STATE_HSDS,
    ];
}

/// One chain entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub enabled: bool,
    /// Raw narration template; token substitution happens at execution time
    pub template: String,
    /// Pause after this step, before scaling
    pub delay_seconds: f32,
}

impl Step {
    pub fn new(template: impl Into<String>, delay_seconds: f32) -> Self {
        Self {
            enabled: true,
            template: template.into(),
            delay_seconds,
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self {
            enabled: true,
            template: String::new(),
            delay_seconds: 0.5,
        }
    }
}

/// A named, ordered script of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    pub steps: Vec<Step>,
}

/// The external chain catalog, read-only to the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainCatalog {
    chains: Vec<Chain>,
}

impl ChainCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a chain by name
    pub fn insert(&mut self, name: impl Into<String>, steps: Vec<Step>) {
        let name = name.into();
        if let Some(existing) = self
            .chains
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&name))
        {
            existing.steps = steps;
        } else {
            self.chains.push(Chain { name, steps });
        }
    }

    pub fn get(&self, name: &str) -> Option<&Chain> {
        self.chains
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn chain_names(&self) -> Vec<&str> {
        self.chains.iter().map(|c| c.name.as_str()).collect()
    }

    /// Required chain names missing from the catalog
    pub fn missing_required(&self) -> Vec<&'static str> {
        names::REQUIRED
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect()
    }

    /// Minimal stock catalog covering every required chain, in the shape a
    /// fresh table ships with before the host customises narration
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        let draw = |announce: &str| {
            vec![
                Step::new(announce, 0.8),
                Step::new("/dice party 13", 1.0),
            ]
        };

        catalog.insert(
            names::DEAL_START,
            vec![
                Step::new("/p The round begins. Dealer draws.", 0.8),
                Step::new("/dice party 13", 1.0),
            ],
        );
        catalog.insert(
            names::INITIAL,
            vec![
                Step::new("/p Cards for <t>.", 0.8),
                Step::new("/dice party 13", 1.0),
                Step::new("/dice party 13", 1.0),
            ],
        );
        catalog.insert(names::HIT, draw("/p <t> takes a card."));
        catalog.insert(names::DD, draw("/p <t> doubles down. One card, then it stands."));
        catalog.insert(names::SPLIT, draw("/p <t> splits the pair."));
        catalog.insert(names::DEAL_HIT, draw("/p The dealer draws."));
        catalog.insert(
            names::STAND,
            vec![Step::new("/p <t> stands at <points>.", 0.8)],
        );
        catalog.insert(
            names::DEAL_STAND,
            vec![Step::new("/p The dealer stands at <points>.", 0.8)],
        );
        catalog.insert(
            names::PLAYER_BJ,
            vec![Step::new("/p Blackjack! <t> is set with <cards>.", 0.8)],
        );
        catalog.insert(
            names::PLAYER_DIRTY_BJ,
            vec![Step::new("/p <t> lands on exactly 21.", 0.8)],
        );
        catalog.insert(
            names::PLAYER_BUST,
            vec![Step::new("/p <t> busts with <points>.", 0.8)],
        );
        catalog.insert(
            names::PLAYER_DD_FORCED_STAND,
            vec![Step::new("/p Double-down card dealt; <t> stands at <points>.", 0.8)],
        );
        catalog.insert(
            names::DEALER_BJ,
            vec![Step::new("/p The dealer shows 21.", 0.8)],
        );
        catalog.insert(
            names::DEALER_BUST,
            vec![Step::new("/p The dealer busts!", 0.8)],
        );
        catalog.insert(
            names::RESULT_PLAYER_WIN,
            vec![Step::new("/p <t> wins this one.", 0.6)],
        );
        catalog.insert(
            names::RESULT_PLAYER_PUSH,
            vec![Step::new("/p <t> pushes; the stake goes back.", 0.6)],
        );
        catalog.insert(
            names::RESULT_PLAYER_BUSTED,
            vec![Step::new("/p <t> busted this round.", 0.6)],
        );
        catalog.insert(
            names::RESULT_PLAYER_LOST,
            vec![Step::new("/p <t> loses to the house.", 0.6)],
        );
        catalog.insert(
            names::RESULT_SMALL,
            vec![Step::new("/p Results: <results>", 0.9)],
        );
        catalog.insert(
            names::STATE_HS,
            vec![Step::new("/p <t> (<points>): hit or stand?", 0.8)],
        );
        catalog.insert(
            names::STATE_HSD,
            vec![Step::new("/p <t> (<points>): hit, stand or double down?", 0.8)],
        );
        catalog.insert(
            names::STATE_HSDS,
            vec![Step::new("/p <t> (<points>): hit, stand, double down or split?", 0.8)],
        );
        catalog
    }
}

/// Delivers resolved text to the chat channel; fire-and-forget
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, text: &str) -> Result<()>;
}

/// Token substitution over a raw step template; opaque to the engine
#[async_trait]
pub trait TemplateResolver: Send + Sync {
    async fn resolve(&self, template: &str, target: &str) -> Result<String>;
}

/// Persists table state after state-mutating actions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn persist(&self, table: &Table) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_every_required_chain() {
        let catalog = ChainCatalog::standard();
        assert!(catalog.missing_required().is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = ChainCatalog::standard();
        assert!(catalog.get("dealstart").is_some());
        assert!(catalog.get("DEALSTART").is_some());
        assert!(catalog.get("NoSuchChain").is_none());
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut catalog = ChainCatalog::new();
        catalog.insert("Hit", vec![Step::new("/p a", 0.1)]);
        catalog.insert("hit", vec![Step::new("/p b", 0.1), Step::new("/p c", 0.1)]);

        assert_eq!(catalog.get("Hit").unwrap().steps.len(), 2);
        assert_eq!(catalog.chain_names().len(), 1);
    }
}
