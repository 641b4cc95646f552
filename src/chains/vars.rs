//! Session variables and narration token substitution
//!
//! Steps carry raw templates; everything dynamic is filled in here at
//! execution time. Two mechanisms stack: angle-bracket tokens bound to
//! table context (`<t>`, `<points>`, result groups) and named session
//! variables with `${var}` / `$${var}` placeholders. The `$${var}` form
//! consumes the variable, so a one-shot announcement cannot repeat on the
//! next chain that references it.

use crate::error::Result;
use crate::game::table::{CardRecipient, Table};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::TemplateResolver;

/// Result-group variable names the settlement phase fills in. The
/// third entry keeps its historical spelling; hosts have templates
/// written against it.
const RESULT_VARS: [&str; 5] = ["winners", "pushed", "loosers", "busted", "results"];

#[derive(Debug, Clone)]
struct SessionVariable {
    name: String,
    value: String,
}

/// Named string variables scoped to the session, case-insensitive
#[derive(Debug, Default)]
pub struct VariableStore {
    variables: Mutex<Vec<SessionVariable>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite a variable
    pub fn set(&self, name: &str, value: impl Into<String>) {
        let mut variables = self.variables.lock();
        let value = value.into();
        if let Some(existing) = variables
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(name))
        {
            existing.value = value;
        } else {
            variables.push(SessionVariable {
                name: name.to_string(),
                value,
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.variables
            .lock()
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.value.clone())
    }

    pub fn clear(&self) {
        self.variables.lock().clear();
    }

    /// Substitute variable placeholders. `$${var}` inserts the value and
    /// then empties the variable; the plain `${var}` form only inserts.
    /// The consuming pass runs first, so a template carrying both forms
    /// gets the value at the `$${var}` site and an empty string at the
    /// plain one.
    pub fn expand(&self, text: &str) -> String {
        let mut result = text.to_string();
        let mut variables = self.variables.lock();

        for v in variables.iter_mut() {
            let consuming = format!("$${{{}}}", v.name);
            if result.contains(&consuming) {
                result = result.replace(&consuming, &v.value);
                v.value.clear();
            }
        }
        for v in variables.iter() {
            let plain = format!("${{{}}}", v.name);
            if result.contains(&plain) {
                result = result.replace(&plain, &v.value);
            }
        }
        result
    }
}

/// Resolves narration tokens against live table state and the session
/// variable store. Substitution order matches what templates rely on:
/// result groups, then `<t>`, then the target's points and cards, and
/// variable expansion last so variables can carry tokens' output but not
/// the other way round.
pub struct TokenResolver {
    table: Arc<RwLock<Table>>,
    vars: Arc<VariableStore>,
}

impl TokenResolver {
    pub fn new(table: Arc<RwLock<Table>>, vars: Arc<VariableStore>) -> Self {
        Self { table, vars }
    }
}

#[async_trait]
impl TemplateResolver for TokenResolver {
    async fn resolve(&self, template: &str, target: &str) -> Result<String> {
        let mut text = template.to_string();

        for name in RESULT_VARS {
            let token = format!("<{}>", name);
            if text.contains(&token) {
                let value = self.vars.get(name).unwrap_or_default();
                text = text.replace(&token, &value);
            }
        }

        {
            let table = self.table.read().await;
            let recipient = if target.trim().is_empty() {
                None
            } else if table.is_dealer_name(target) {
                Some(CardRecipient::Dealer)
            } else {
                table.participant_by_name(target).map(CardRecipient::Participant)
            };

            match recipient {
                Some(recipient) => {
                    let p = table.participant(recipient);
                    text = text.replace("<t>", p.display_name());
                    if let Some(hand) = p.current_hand() {
                        if text.contains("<points>") {
                            text = text.replace("<points>", &hand.points_label());
                        }
                        text = text.replace("<cards>", &hand.cards_label());
                    }
                }
                None => {
                    // Unknown targets still read naturally in chat
                    text = text.replace("<t>", target);
                }
            }
        }

        Ok(self.vars.expand(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Card, Suit};
    use crate::game::hand::Hand;
    use crate::game::participant::Participant;

    #[test]
    fn consuming_placeholder_empties_the_variable() {
        let vars = VariableStore::new();
        vars.set("dealerpoints", "19");

        assert_eq!(vars.expand("dealer has $${dealerpoints}"), "dealer has 19");
        assert_eq!(vars.expand("dealer has $${dealerpoints}"), "dealer has ");
    }

    #[test]
    fn plain_placeholder_keeps_the_variable() {
        let vars = VariableStore::new();
        vars.set("pot", "500");

        assert_eq!(vars.expand("pot is ${pot}"), "pot is 500");
        assert_eq!(vars.expand("pot is ${pot}"), "pot is 500");
    }

    #[test]
    fn mixed_placeholders_consume_before_the_plain_pass() {
        let vars = VariableStore::new();
        vars.set("pot", "500");

        assert_eq!(
            vars.expand("take $${pot}, rest ${pot}"),
            "take 500, rest "
        );
    }

    #[test]
    fn variable_names_are_case_insensitive() {
        let vars = VariableStore::new();
        vars.set("Winners", "Ann");
        assert_eq!(vars.get("winners").as_deref(), Some("Ann"));
        vars.set("WINNERS", "Bert");
        assert_eq!(vars.get("winners").as_deref(), Some("Bert"));
    }

    #[tokio::test]
    async fn tokens_resolve_against_the_target_participant() {
        let mut table = Table::new("Croupier", 1);
        let mut p = Participant::new("Ann");
        p.alias = "Annie".to_string();
        let mut hand = Hand::new(100);
        hand.cards.push(Card::new(1, Suit::Spades));
        hand.cards.push(Card::new(7, Suit::Hearts));
        p.hands.push(hand);
        table.participants.push(p);

        let resolver = TokenResolver::new(
            Arc::new(RwLock::new(table)),
            Arc::new(VariableStore::new()),
        );

        let text = resolver
            .resolve("/p <t> sits at <points> with <cards>", "ann")
            .await
            .unwrap();
        assert_eq!(text, "/p Annie sits at 8/18 with A♠ 7♥");
    }

    #[tokio::test]
    async fn unknown_target_passes_through_verbatim() {
        let table = Table::new("Croupier", 1);
        let resolver = TokenResolver::new(
            Arc::new(RwLock::new(table)),
            Arc::new(VariableStore::new()),
        );

        let text = resolver.resolve("/p <t> joins", "Stray").await.unwrap();
        assert_eq!(text, "/p Stray joins");
    }

    #[tokio::test]
    async fn result_tokens_read_the_variable_store() {
        let table = Table::new("Croupier", 1);
        let vars = Arc::new(VariableStore::new());
        vars.set("results", "Win: Ann | Bust: Cleo");

        let resolver = TokenResolver::new(Arc::new(RwLock::new(table)), vars);
        let text = resolver.resolve("/p Round over. <results>", "").await.unwrap();
        assert_eq!(text, "/p Round over. Win: Ann | Bust: Cleo");
    }
}
