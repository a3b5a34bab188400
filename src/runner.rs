//! Automation runner — one full pass over a message source.
//!
//! Messages are processed sequentially in fetch order. Each message is
//! its own failure domain: a normalization, evaluation or dispatch
//! failure is recorded in that message's outcome and the run moves on.
//! Only a failure to list messages aborts the run.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::dispatch::{ActionDispatcher, ActionOutcome};
use crate::error::Error;
use crate::rules::engine::RuleEngine;
use crate::source::MessageSource;
use crate::store::MessageStore;

/// Per-message outcome of a run.
#[derive(Debug)]
pub struct RunOutcome {
    pub message_id: String,
    pub matched: bool,
    pub actions: Vec<ActionOutcome>,
    pub error: Option<Error>,
}

impl RunOutcome {
    fn failed(id: &str, error: Error) -> Self {
        Self {
            message_id: id.to_string(),
            matched: false,
            actions: Vec::new(),
            error: Some(error),
        }
    }

    /// True when evaluation errored or any action failed.
    pub fn has_failure(&self) -> bool {
        self.error.is_some() || self.actions.iter().any(|a| !a.ok())
    }
}

/// Drives fetch → evaluate → dispatch for one rule.
pub struct AutomationRunner {
    source: Arc<dyn MessageSource>,
    engine: RuleEngine,
    dispatcher: ActionDispatcher,
    mirror: Option<Arc<MessageStore>>,
}

impl AutomationRunner {
    pub fn new(
        source: Arc<dyn MessageSource>,
        engine: RuleEngine,
        dispatcher: ActionDispatcher,
    ) -> Self {
        Self {
            source,
            engine,
            dispatcher,
            mirror: None,
        }
    }

    /// Mirror every fetched message into the store before evaluation.
    pub fn with_mirror(mut self, store: Arc<MessageStore>) -> Self {
        self.mirror = Some(store);
        self
    }

    /// Run one pass: evaluate every message from the source against the
    /// rule and dispatch actions on match.
    pub async fn run(&self) -> Result<Vec<RunOutcome>, Error> {
        let ids = self.source.list_message_ids().await?;
        info!(
            rule = %self.engine.rule().name,
            messages = ids.len(),
            "Starting automation pass"
        );

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in &ids {
            outcomes.push(self.process(id).await);
        }

        let matched = outcomes.iter().filter(|o| o.matched).count();
        let failed = outcomes.iter().filter(|o| o.has_failure()).count();
        info!(
            rule = %self.engine.rule().name,
            messages = outcomes.len(),
            matched,
            failed,
            "Automation pass complete"
        );
        Ok(outcomes)
    }

    async fn process(&self, id: &str) -> RunOutcome {
        let message = match self.source.get_message(id).await {
            Ok(m) => m,
            Err(e) => {
                warn!(message_id = id, error = %e, "Failed to fetch message");
                return RunOutcome::failed(id, e);
            }
        };

        // Mirror failures are logged but never block evaluation.
        if let Some(store) = &self.mirror {
            if let Err(e) = store.upsert(
                &message.id,
                &message.subject,
                &message.from,
                &message.to,
                message.date_received,
            ) {
                warn!(message_id = %message.id, error = %e, "Failed to mirror message");
            }
        }

        let eval = match self.engine.evaluate(&message, Utc::now()) {
            Ok(eval) => eval,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Rule evaluation failed");
                return RunOutcome::failed(id, e.into());
            }
        };

        if !eval.matched {
            info!(
                message_id = %message.id,
                subject = %message.subject,
                "Conditions not matched"
            );
            return RunOutcome {
                message_id: message.id,
                matched: false,
                actions: Vec::new(),
                error: None,
            };
        }

        info!(
            message_id = %message.id,
            subject = %message.subject,
            "Conditions matched, triggering actions"
        );
        let actions = self
            .dispatcher
            .dispatch(&message, &self.engine.rule().actions)
            .await;
        info!(
            message_id = %message.id,
            actions = actions.len(),
            failed = actions.iter().filter(|a| !a.ok()).count(),
            "Actions triggered"
        );

        RunOutcome {
            message_id: message.id,
            matched: true,
            actions,
            error: None,
        }
    }
}
