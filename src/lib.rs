//! Chatjack
//!
//! A blackjack orchestration engine for chat-driven tables. The host's
//! chat channel is the table surface: player actions fire configurable
//! command chains into the channel, draw results observed in the channel
//! come back as cards, and the engine keeps phase, turn order, funds and
//! settlement consistent in between.
//!
//! The crate splits into:
//! - [`game`]: table state, turn sequencing, scoring, settlement and the
//!   orchestrating [`game::GameEngine`]
//! - [`chains`]: the chain catalog, the executor with its draw-wait and
//!   cancellation protocol, token substitution and session persistence
//! - [`config`]: table rules and executor pacing as TOML
//! - [`error`] and [`logging`]: the shared error type and tracing setup

pub mod chains;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;

pub use chains::{ChainCatalog, ChainExecutor, Dispatcher, SessionStore, TemplateResolver};
pub use config::GameConfig;
pub use error::{Error, Result};
pub use game::{GameEngine, GamePhase, Table};
