//! Game engine
//!
//! Orchestrates one table: player actions fire their chains, observed
//! draw results land as cards and may branch the narration, the turn
//! sequencer decides who plays next, settlement closes the round. Every
//! state-mutating entry point snapshots the table first and persists it
//! afterwards, so the host can undo a botched action and a crash loses at
//! most the action in flight.
//!
//! Locking discipline: the table lock is never held across a chain
//! execution. Engine methods mutate under the lock in a tight scope, drop
//! it, then run chains; the card observer re-acquires it concurrently.

use crate::chains::{names, ChainExecutor, SessionStore, VariableStore};
use crate::config::GameConfig;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::participant::Participant;
use super::payout::{judge_hand, settlement_return, RoundSummary};
use super::snapshot::SnapshotLog;
use super::table::{CardRecipient, GamePhase, Table};
use super::turns::{advance_turn, state_prompt_chain, TurnAdvance};

/// How long a branch waits for the superseded chain to wind down
const CANCEL_LIMIT: Duration = Duration::from_secs(5);
/// How long a queued state prompt waits for the executor to go idle
const PROMPT_QUEUE_LIMIT: Duration = Duration::from_secs(30);

/// A doubling action paused because the bank cannot cover the extra stake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFunds {
    pub kind: PendingKind,
    pub participant: String,
    pub missing: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    DoubleDown,
    Split,
}

/// What an observed card means for the flow, decided under the table lock
/// and acted on after it is released
enum CardOutcome {
    /// Release the suspended chain; nothing else changes
    Release,
    /// Release and advance the rotation (initial two-card hand complete)
    ReleaseAndAdvance,
    /// Release and re-prompt the target, whose hand is still live
    ReleaseAndPrompt { chain: &'static str, target: String },
    /// Cancel the running chain and narrate the branch instead
    Branch {
        chain: &'static str,
        target: String,
        dealer: bool,
    },
}

pub struct GameEngine {
    table: Arc<RwLock<Table>>,
    config: GameConfig,
    executor: Arc<ChainExecutor>,
    vars: Arc<VariableStore>,
    snapshots: Arc<SnapshotLog>,
    store: Arc<dyn SessionStore>,
    pending_funds: Mutex<Option<PendingFunds>>,
}

impl GameEngine {
    pub fn new(
        table: Arc<RwLock<Table>>,
        config: GameConfig,
        executor: Arc<ChainExecutor>,
        vars: Arc<VariableStore>,
        snapshots: Arc<SnapshotLog>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            table,
            config,
            executor,
            vars,
            snapshots,
            store,
            pending_funds: Mutex::new(None),
        }
    }

    pub fn table(&self) -> Arc<RwLock<Table>> {
        Arc::clone(&self.table)
    }

    pub fn snapshots(&self) -> Arc<SnapshotLog> {
        Arc::clone(&self.snapshots)
    }

    pub fn pending_funds(&self) -> Option<PendingFunds> {
        self.pending_funds.lock().clone()
    }

    /// Seat a new participant with a starting bank
    pub async fn seat(&self, name: &str, bank: i64) -> Result<()> {
        let mut table = self.table.write().await;
        if table.participant_by_name(name).is_some() || table.is_dealer_name(name) {
            return Err(Error::Config(format!("{} is already seated", name)));
        }
        let mut participant = Participant::new(name);
        participant.bank = bank;
        table.participants.push(participant);
        drop(table);

        info!(participant = name, bank, "seated");
        self.persist().await;
        Ok(())
    }

    pub async fn set_bet(&self, name: &str, amount: i64) -> Result<()> {
        let mut table = self.table.write().await;
        let idx = table
            .participant_by_name(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
        table.participants[idx].current_bet = amount.max(0);
        Ok(())
    }

    /// Open a new round: reset everyone, deal the dealer's up card via the
    /// round-start chain, then hand the turn to the first participant for
    /// their initial deal.
    pub async fn start_round(&self) -> Result<()> {
        let dealer_name = {
            let mut table = self.table.write().await;
            if !matches!(table.phase, GamePhase::Waiting | GamePhase::Payout) {
                return Err(Error::InvalidPhase {
                    action: "start_round",
                    phase: table.phase.to_string(),
                });
            }
            if table.eligible().is_empty() {
                table.phase = GamePhase::Waiting;
                warn!("no eligible participants, round not started");
                return Ok(());
            }

            table.dealer.hands.clear();
            table.dealer.current_hand_index = 0;
            // Held and benched participants carry hands from the previous
            // round too; everyone seated starts fresh.
            for p in table.participants.iter_mut() {
                if p.active {
                    p.reset_for_new_round();
                }
            }
            table.phase = GamePhase::InitialDeal;

            let dealer_name = table.dealer.name.clone();
            table.selected_target = Some(dealer_name.clone());
            table.forced_recipient = Some(dealer_name.clone());
            self.snapshots.push_snapshot(&table, "round start");
            dealer_name
        };

        info!("round started");
        self.executor.run(names::DEAL_START, &dealer_name).await;

        {
            let mut table = self.table.write().await;
            table.forced_recipient = None;
            if let Some(hand) = table.dealer.hands.first() {
                if !hand.cards.is_empty() {
                    self.vars.set("dealerpoints", hand.best_score().to_string());
                }
            }

            for p in table.participants.iter_mut() {
                p.is_current_turn = false;
            }
            if let Some(&first) = table.eligible().first() {
                table.participants[first].is_current_turn = true;
                table.participants[first].current_hand_index = 0;
                table.selected_target = Some(table.participants[first].name.clone());
            }
        }

        self.persist().await;
        Ok(())
    }

    /// Deal the initial hand to one participant. The stake leaves the bank
    /// here; it comes back through settlement.
    pub async fn deal_initial(&self, name: &str) -> Result<()> {
        self.require_phase(GamePhase::InitialDeal, "deal_initial").await?;

        let participant_name = {
            let mut table = self.table.write().await;
            let idx = table
                .participant_by_name(name)
                .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
            self.snapshots.push_snapshot(&table, &format!("deal:{}", name));

            let bet = table.participants[idx].current_bet;
            if table.participants[idx].bank < bet {
                let missing = bet - table.participants[idx].bank;
                warn!(participant = name, missing, "bank cannot cover the stake");
                return Err(Error::Config(format!(
                    "{} is short {} for the stake",
                    name, missing
                )));
            }
            table.participants[idx].bank -= bet;

            let participant_name = table.participants[idx].name.clone();
            table.selected_target = Some(participant_name.clone());
            table.forced_recipient = Some(participant_name.clone());
            participant_name
        };

        self.executor.run(names::INITIAL, &participant_name).await;

        {
            let mut table = self.table.write().await;
            table.forced_recipient = None;
            if let Some(idx) = table.participant_by_name(&participant_name) {
                table.participants[idx].initial_hand_dealt = true;
            }
        }
        self.persist().await;
        Ok(())
    }

    /// Draw one more card for the current hand
    pub async fn hit(&self, name: &str) -> Result<()> {
        self.require_phase(GamePhase::PlayersTurn, "hit").await?;
        let participant_name = self.arm_action(name, "hit").await?;

        self.executor.run(names::HIT, &participant_name).await;

        self.clear_forced().await;
        self.persist().await;
        Ok(())
    }

    /// Stand on the current hand and advance the rotation
    pub async fn stand(&self, name: &str) -> Result<()> {
        self.require_phase(GamePhase::PlayersTurn, "stand").await?;
        let participant_name = {
            let mut table = self.table.write().await;
            let idx = table
                .participant_by_name(name)
                .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
            self.snapshots.push_snapshot(&table, &format!("stand:{}", name));

            table.participants[idx].clamp_hand_index();
            if let Some(hand) = table.participants[idx].current_hand_mut() {
                hand.stand = true;
            }
            let participant_name = table.participants[idx].name.clone();
            table.selected_target = Some(participant_name.clone());
            table.forced_recipient = Some(participant_name.clone());
            participant_name
        };

        self.executor.run(names::STAND, &participant_name).await;

        self.clear_forced().await;
        self.advance_and_fire().await;
        self.persist().await;
        Ok(())
    }

    /// Double the stake for exactly one more card. Blocks as a pending
    /// action when the bank cannot cover the second stake.
    pub async fn double_down(&self, name: &str) -> Result<()> {
        self.require_phase(GamePhase::PlayersTurn, "double_down").await?;

        if let Some(pending) = self.check_funds(name, PendingKind::DoubleDown).await? {
            info!(
                participant = pending.participant,
                missing = pending.missing,
                "double down waiting for funds"
            );
            return Ok(());
        }
        self.execute_double_down(name).await
    }

    /// Split a two-card pair into two hands. Blocks as a pending action
    /// when the bank cannot cover the second stake.
    pub async fn split(&self, name: &str) -> Result<()> {
        self.require_phase(GamePhase::PlayersTurn, "split").await?;

        {
            let table = self.table.read().await;
            let idx = table
                .participant_by_name(name)
                .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
            if table.participants[idx].hands.len() >= self.config.max_hands_per_participant {
                return Err(Error::Config(format!(
                    "{} already holds the maximum number of hands",
                    name
                )));
            }
        }

        if let Some(pending) = self.check_funds(name, PendingKind::Split).await? {
            info!(
                participant = pending.participant,
                missing = pending.missing,
                "split waiting for funds"
            );
            return Ok(());
        }
        self.execute_split(name).await
    }

    /// Retry the pending double-down or split after the participant topped
    /// up their bank
    pub async fn confirm_funds(&self, name: &str) -> Result<()> {
        let pending = {
            let mut slot = self.pending_funds.lock();
            match slot.as_ref() {
                Some(p) if p.participant.eq_ignore_ascii_case(name) => slot.take(),
                _ => None,
            }
        };
        let Some(pending) = pending else {
            return Err(Error::Config(format!("no pending action for {}", name)));
        };

        {
            let table = self.table.read().await;
            let idx = table
                .participant_by_name(name)
                .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
            let p = &table.participants[idx];
            if p.bank < p.current_bet {
                warn!(participant = name, "bank still short, action stays blocked");
                *self.pending_funds.lock() = Some(pending);
                return Ok(());
            }
        }

        match pending.kind {
            PendingKind::DoubleDown => self.execute_double_down(name).await,
            PendingKind::Split => self.execute_split(name).await,
        }
    }

    async fn execute_double_down(&self, name: &str) -> Result<()> {
        let participant_name = {
            let mut table = self.table.write().await;
            let idx = table
                .participant_by_name(name)
                .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
            self.snapshots.push_snapshot(&table, &format!("dd:{}", name));

            let bet = table.participants[idx].current_bet;
            table.participants[idx].bank -= bet;
            table.participants[idx].clamp_hand_index();
            if let Some(hand) = table.participants[idx].current_hand_mut() {
                hand.double_down = true;
                hand.bet *= 2;
            }

            let participant_name = table.participants[idx].name.clone();
            table.selected_target = Some(participant_name.clone());
            table.forced_recipient = Some(participant_name.clone());
            participant_name
        };

        // The drawn card lands through the observer, which forces the
        // stand and advances the rotation.
        self.executor.run(names::DD, &participant_name).await;

        self.clear_forced().await;
        self.persist().await;
        Ok(())
    }

    async fn execute_split(&self, name: &str) -> Result<()> {
        let participant_name = {
            let mut table = self.table.write().await;
            let idx = table
                .participant_by_name(name)
                .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
            self.snapshots.push_snapshot(&table, &format!("split:{}", name));

            let p = &mut table.participants[idx];
            p.clamp_hand_index();
            let bet = p.current_bet;
            let hand_index = p.current_hand_index;
            if p.hands[hand_index].cards.len() != 2 {
                return Err(Error::Config(format!(
                    "{} cannot split a hand that is not a two-card pair",
                    name
                )));
            }
            p.bank -= bet;

            let moved = p.hands[hand_index].cards.remove(1);
            let mut new_hand = super::hand::Hand::new(bet);
            new_hand.cards.push(moved);
            p.hands.push(new_hand);

            let participant_name = p.name.clone();
            table.selected_target = Some(participant_name.clone());
            table.forced_recipient = Some(participant_name.clone());
            participant_name
        };

        // The split chain draws the replacement card for the first hand.
        self.executor.run(names::SPLIT, &participant_name).await;

        self.clear_forced().await;
        self.persist().await;
        Ok(())
    }

    /// Dealer draws one card
    pub async fn dealer_hit(&self) -> Result<()> {
        let dealer_name = {
            let mut table = self.table.write().await;
            table.phase = GamePhase::DealerTurn;
            let dealer_name = table.dealer.name.clone();
            table.selected_target = Some(dealer_name.clone());
            table.forced_recipient = Some(dealer_name.clone());
            self.snapshots.push_snapshot(&table, "dealer hit");
            dealer_name
        };

        self.executor.run(names::DEAL_HIT, &dealer_name).await;

        self.clear_forced().await;
        self.persist().await;
        Ok(())
    }

    /// Dealer stands; the round moves to settlement
    pub async fn dealer_stand(&self) -> Result<()> {
        let dealer_name = {
            let mut table = self.table.write().await;
            table.phase = GamePhase::Payout;
            let dealer_name = table.dealer.name.clone();
            table.selected_target = Some(dealer_name.clone());
            table.forced_recipient = Some(dealer_name.clone());
            self.snapshots.push_snapshot(&table, "dealer stand");
            dealer_name
        };

        self.executor.run(names::DEAL_STAND, &dealer_name).await;

        self.clear_forced().await;
        self.settle().await;
        Ok(())
    }

    /// Park a participant on the bench for the rest of the round. Refused
    /// for the last player in the rotation and for anyone who already used
    /// their bench re-entry this round.
    pub async fn move_to_bench(&self, name: &str) -> Result<()> {
        let mut table = self.table.write().await;
        let idx = table
            .participant_by_name(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;

        if table.participants[idx].was_on_hold_this_round {
            return Err(Error::Config(format!(
                "{} was already benched this round",
                name
            )));
        }
        if table.eligible().len() == 1 && table.bench().is_empty() {
            return Err(Error::Config(
                "cannot bench the last participant in the rotation".into(),
            ));
        }

        let p = &mut table.participants[idx];
        p.on_bench = true;
        p.was_on_hold_this_round = true;
        p.is_current_turn = false;
        debug!(participant = name, "moved to bench");
        Ok(())
    }

    /// Return a benched participant to the rotation by hand
    pub async fn return_from_bench(&self, name: &str) -> Result<()> {
        let mut table = self.table.write().await;
        let idx = table
            .participant_by_name(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
        if table.participants[idx].on_bench {
            table.participants[idx].on_bench = false;
            debug!(participant = name, "returned from bench");
        }
        Ok(())
    }

    /// Bridge an observed draw result into the game. Applies the card to
    /// the resolved recipient, decides whether the running chain keeps
    /// going or a branch takes over, and drives whatever follows.
    pub async fn on_card_observed(&self, value: u8, hint: Option<&str>) -> Result<()> {
        let outcome = {
            let mut table = self.table.write().await;
            self.apply_card(&mut table, value, hint)
        };

        match outcome {
            CardOutcome::Release => {
                self.executor.control().release_draw();
            }
            CardOutcome::ReleaseAndAdvance => {
                self.executor.control().release_draw();
                self.advance_and_fire().await;
            }
            CardOutcome::ReleaseAndPrompt { chain, target } => {
                self.executor.control().release_draw();
                self.spawn_prompt(chain, target);
            }
            CardOutcome::Branch {
                chain,
                target,
                dealer,
            } => {
                if !self.executor.control().cancel_and_wait(CANCEL_LIMIT).await {
                    warn!(chain, "superseded chain did not stop in time");
                }
                self.executor.run_internal(chain, &target).await;

                if dealer {
                    self.table.write().await.phase = GamePhase::Payout;
                    self.settle().await;
                } else {
                    self.advance_and_fire().await;
                }
            }
        }

        self.persist().await;
        Ok(())
    }

    /// Apply the card under the lock and classify what happens next.
    /// Branch precedence mirrors the draw synchronizer: dealer 21 before
    /// dealer bust; a player bust before a dirty 21 before the double-down
    /// forced stand.
    fn apply_card(&self, table: &mut Table, value: u8, hint: Option<&str>) -> CardOutcome {
        let recipient = table.resolve_card_recipient(hint);
        let is_dealer = recipient == CardRecipient::Dealer;
        let phase = table.phase;

        let card = table.shoe.pull(value);
        let fallback_bet = table.participant(recipient).current_bet;
        let target = table.participant_mut(recipient);
        if target.hands.is_empty() {
            target.hands.push(super::hand::Hand::new(fallback_bet));
        }
        target.clamp_hand_index();
        let target_name = target.name.clone();
        let hand_index = target.current_hand_index;
        let hand = &mut target.hands[hand_index];
        hand.cards.push(card);

        hand.bust = hand.is_bust_score();
        // Only the initial deal makes a natural; a split hand reaching a
        // two-card 21 later stands as a plain 21.
        if phase == GamePhase::InitialDeal && hand.cards.len() == 2 && hand.is_natural_blackjack() {
            hand.natural_blackjack = true;
            hand.stand = true;
        }
        let best = hand.best_score();
        let cards = hand.cards.len();
        debug!(recipient = %target_name, card = %card, best, "card applied");

        if is_dealer {
            if phase != GamePhase::DealerTurn {
                return CardOutcome::Release;
            }
            if best == 21 {
                return CardOutcome::Branch {
                    chain: names::DEALER_BJ,
                    target: target_name,
                    dealer: true,
                };
            }
            if hand.bust {
                return CardOutcome::Branch {
                    chain: names::DEALER_BUST,
                    target: target_name,
                    dealer: true,
                };
            }
            return CardOutcome::Release;
        }

        match phase {
            GamePhase::InitialDeal => {
                if cards == 2 {
                    target.initial_hand_dealt = true;
                    if best == 21 {
                        let hand = &mut target.hands[hand_index];
                        hand.stand = true;
                        hand.natural_blackjack = true;
                        return CardOutcome::Branch {
                            chain: names::PLAYER_BJ,
                            target: target_name,
                            dealer: false,
                        };
                    }
                    return CardOutcome::ReleaseAndAdvance;
                }
                CardOutcome::Release
            }
            GamePhase::PlayersTurn => {
                let hand = &mut target.hands[hand_index];
                if best > 21 {
                    hand.bust = true;
                    hand.stand = true;
                    return CardOutcome::Branch {
                        chain: names::PLAYER_BUST,
                        target: target_name,
                        dealer: false,
                    };
                }
                if best == 21 {
                    hand.stand = true;
                    let chain = if cards == 2 && hand.natural_blackjack {
                        names::PLAYER_BJ
                    } else {
                        names::PLAYER_DIRTY_BJ
                    };
                    return CardOutcome::Branch {
                        chain,
                        target: target_name,
                        dealer: false,
                    };
                }
                if hand.double_down {
                    hand.stand = true;
                    return CardOutcome::Branch {
                        chain: names::PLAYER_DD_FORCED_STAND,
                        target: target_name,
                        dealer: false,
                    };
                }
                if !hand.bust && !hand.stand {
                    if let CardRecipient::Participant(idx) = recipient {
                        if let Some(chain) =
                            state_prompt_chain(&table.participants[idx], &self.config)
                        {
                            return CardOutcome::ReleaseAndPrompt {
                                chain,
                                target: target_name,
                            };
                        }
                    }
                }
                CardOutcome::Release
            }
            _ => CardOutcome::Release,
        }
    }

    /// Move the rotation forward and narrate whatever the sequencer
    /// decided: prompt the next hand, open the dealer's turn, or settle a
    /// fully busted round.
    pub async fn advance_and_fire(&self) {
        let advance = {
            let mut table = self.table.write().await;
            let advance = advance_turn(&mut table, &self.config);
            if advance == TurnAdvance::DealerTurn {
                if let Some(hand) = table.dealer.hands.first() {
                    if !hand.cards.is_empty() {
                        self.vars.set("dealerpoints", hand.best_score().to_string());
                    }
                }
            }
            advance
        };

        match advance {
            TurnAdvance::Switched { index, fire_prompt } => {
                if fire_prompt {
                    let (chain, target) = {
                        let table = self.table.read().await;
                        let p = &table.participants[index];
                        (state_prompt_chain(p, &self.config), p.name.clone())
                    };
                    if let Some(chain) = chain {
                        self.spawn_prompt(chain, target);
                    }
                }
            }
            TurnAdvance::DealerTurn => {
                info!("rotation complete, dealer plays");
            }
            TurnAdvance::AllBustPayout => {
                self.settle().await;
            }
            TurnAdvance::Idle => {}
        }
    }

    /// State prompts queue behind whatever chain is finishing instead of
    /// being dropped by the overlap guard.
    fn spawn_prompt(&self, chain: &'static str, target: String) {
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            if !executor.control().wait_idle(PROMPT_QUEUE_LIMIT).await {
                warn!(chain, "state prompt dropped, executor never went idle");
                return;
            }
            executor.run(chain, &target).await;
        });
    }

    /// Settle every hand against the dealer and narrate the results,
    /// either one chain per hand or one consolidated message.
    pub async fn settle(&self) {
        let (per_hand, summary) = {
            let mut table = self.table.write().await;
            table.phase = GamePhase::Payout;

            let dealer_best = table
                .dealer
                .hands
                .first()
                .map_or(0, super::hand::Hand::best_score);
            let dealer_bust = table.dealer.hands.first().map_or(false, |h| h.bust);

            let mut per_hand: Vec<(String, &'static str)> = Vec::new();
            let mut summary = RoundSummary::default();

            let indexes: Vec<usize> = table
                .participants
                .iter()
                .enumerate()
                .filter(|(_, p)| p.active)
                .map(|(idx, _)| idx)
                .collect();

            for idx in indexes {
                table.participants[idx].is_current_turn = false;
                let shown = table.participants[idx].display_name().to_string();

                let hand_count = table.participants[idx].hands.len();
                for hand_index in 0..hand_count {
                    let hand = table.participants[idx].hands[hand_index].clone();
                    // A held participant keeps a fresh empty hand through
                    // the round; there is nothing to judge.
                    if hand.cards.is_empty() {
                        continue;
                    }
                    let outcome = judge_hand(&hand, dealer_best, dealer_bust);
                    let credit = settlement_return(&hand, outcome, &self.config);
                    table.participants[idx].bank += credit;

                    debug!(
                        participant = %shown,
                        hand = hand_index,
                        ?outcome,
                        credit,
                        "hand settled"
                    );
                    per_hand.push((shown.clone(), outcome.chain()));
                    summary.record(&shown, outcome);
                }
            }

            self.snapshots.push_snapshot(&table, "settlement");
            (per_hand, summary)
        };

        if self.config.compact_results {
            self.vars.set("winners", summary.winners.join(", "));
            self.vars.set("pushed", summary.pushed.join(", "));
            self.vars.set("loosers", summary.losers.join(", "));
            self.vars.set("busted", summary.busted.join(", "));
            self.vars.set("results", summary.results_line());
            self.executor.run_internal(names::RESULT_SMALL, "").await;
        } else {
            for (display, chain) in per_hand {
                self.executor.run_internal(chain, &display).await;
            }
        }

        info!("round settled");
        self.persist().await;
    }

    async fn require_phase(&self, expected: GamePhase, action: &'static str) -> Result<()> {
        let table = self.table.read().await;
        if table.phase != expected {
            return Err(Error::InvalidPhase {
                action,
                phase: table.phase.to_string(),
            });
        }
        Ok(())
    }

    /// Snapshot, aim the forced recipient at the actor, and return their
    /// canonical name
    async fn arm_action(&self, name: &str, action: &str) -> Result<String> {
        let mut table = self.table.write().await;
        let idx = table
            .participant_by_name(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
        self.snapshots
            .push_snapshot(&table, &format!("{}:{}", action, name));

        let participant_name = table.participants[idx].name.clone();
        table.selected_target = Some(participant_name.clone());
        table.forced_recipient = Some(participant_name.clone());
        Ok(participant_name)
    }

    async fn clear_forced(&self) {
        self.table.write().await.forced_recipient = None;
    }

    /// Check the bank ahead of a doubling action; records and returns the
    /// pending entry when it cannot be covered
    async fn check_funds(&self, name: &str, kind: PendingKind) -> Result<Option<PendingFunds>> {
        let table = self.table.read().await;
        let idx = table
            .participant_by_name(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))?;
        let p = &table.participants[idx];
        if p.bank >= p.current_bet {
            return Ok(None);
        }
        let pending = PendingFunds {
            kind,
            participant: p.name.clone(),
            missing: p.current_bet - p.bank,
        };
        *self.pending_funds.lock() = Some(pending.clone());
        Ok(Some(pending))
    }

    async fn persist(&self) {
        let table = self.table.read().await;
        if let Err(e) = self.store.persist(&table).await {
            warn!(error = %e, "session persist failed");
        }
    }
}
