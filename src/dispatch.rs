//! Action dispatch — maps matched-rule actions onto gateway calls.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Error;
use crate::gateway::MailboxGateway;
use crate::message::Message;
use crate::rules::model::Action;
use crate::rules::validate::{CheckedAction, Folder, MarkLabel, validate_action};

/// Result of applying one action to one message.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: Action,
    pub result: Result<(), Error>,
}

impl ActionOutcome {
    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Applies a rule's actions against the mailbox gateway.
pub struct ActionDispatcher {
    gateway: Arc<dyn MailboxGateway>,
}

impl ActionDispatcher {
    pub fn new(gateway: Arc<dyn MailboxGateway>) -> Self {
        Self { gateway }
    }

    /// Apply each action in order, collecting per-action outcomes.
    ///
    /// Actions are independent failure domains: one failed gateway call
    /// does not stop the remaining actions for the same message.
    pub async fn dispatch(&self, message: &Message, actions: &[Action]) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(actions.len());
        for action in actions {
            let result = self.apply(&message.id, action).await;
            if let Err(e) = &result {
                warn!(
                    message_id = %message.id,
                    action = %action.action,
                    value = %action.value,
                    error = %e,
                    "Action failed"
                );
            } else {
                debug!(
                    message_id = %message.id,
                    action = %action.action,
                    value = %action.value,
                    "Action applied"
                );
            }
            outcomes.push(ActionOutcome {
                action: action.clone(),
                result,
            });
        }
        outcomes
    }

    /// Validate one action and invoke the matching gateway operation.
    async fn apply(&self, message_id: &str, action: &Action) -> Result<(), Error> {
        match validate_action(action)? {
            // READ is the absence of the UNREAD label, not a label itself.
            CheckedAction::MarkAs(MarkLabel::Read) => {
                self.gateway.remove_label(message_id, "UNREAD").await?;
            }
            CheckedAction::MarkAs(MarkLabel::Unread) => {
                self.gateway.add_label(message_id, "UNREAD").await?;
            }
            CheckedAction::MarkAs(MarkLabel::Important) => {
                self.gateway.add_label(message_id, "IMPORTANT").await?;
            }
            // The folder label set is replaced, not merged: strip the
            // other destinations, then add the target.
            CheckedAction::MoveTo(destination) => {
                for folder in Folder::ALL {
                    if folder != destination {
                        self.gateway
                            .remove_label(message_id, folder.as_label())
                            .await?;
                    }
                }
                self.gateway
                    .add_label(message_id, destination.as_label())
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::error::GatewayError;

    /// Records every gateway call; optionally fails on a given label.
    struct RecordingGateway {
        calls: Mutex<Vec<(String, String, String)>>,
        fail_on_label: Option<String>,
    }

    impl RecordingGateway {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_label: None,
            }
        }

        fn failing_on(label: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_label: Some(label.to_string()),
            }
        }

        fn calls(&self) -> Vec<(String, String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, op: &str, id: &str, label: &str) -> Result<(), GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((op.into(), id.into(), label.into()));
            if self.fail_on_label.as_deref() == Some(label) {
                return Err(GatewayError::Api {
                    operation: op.into(),
                    status: 429,
                    body: "rate limited".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MailboxGateway for RecordingGateway {
        async fn add_label(&self, id: &str, label: &str) -> Result<(), GatewayError> {
            self.record("add", id, label)
        }

        async fn remove_label(&self, id: &str, label: &str) -> Result<(), GatewayError> {
            self.record("remove", id, label)
        }
    }

    fn message() -> Message {
        Message {
            id: "m1".into(),
            from: "a@x.com".into(),
            to: "b@x.com".into(),
            subject: "s".into(),
            date_received: Utc::now(),
            raw_labels: Default::default(),
        }
    }

    fn action(name: &str, value: &str) -> Action {
        Action {
            action: name.into(),
            value: value.into(),
        }
    }

    async fn dispatch_one(
        gateway: Arc<RecordingGateway>,
        action_: Action,
    ) -> Vec<ActionOutcome> {
        ActionDispatcher::new(gateway)
            .dispatch(&message(), &[action_])
            .await
    }

    #[tokio::test]
    async fn mark_as_read_removes_unread() {
        let gw = Arc::new(RecordingGateway::new());
        let outcomes = dispatch_one(Arc::clone(&gw), action("mark_as", "READ")).await;
        assert!(outcomes[0].ok());
        assert_eq!(
            gw.calls(),
            vec![("remove".into(), "m1".into(), "UNREAD".into())]
        );
    }

    #[tokio::test]
    async fn mark_as_important_adds_label() {
        let gw = Arc::new(RecordingGateway::new());
        let outcomes = dispatch_one(Arc::clone(&gw), action("mark_as", "IMPORTANT")).await;
        assert!(outcomes[0].ok());
        assert_eq!(
            gw.calls(),
            vec![("add".into(), "m1".into(), "IMPORTANT".into())]
        );
    }

    #[tokio::test]
    async fn mark_as_unread_adds_label() {
        let gw = Arc::new(RecordingGateway::new());
        dispatch_one(Arc::clone(&gw), action("mark_as", "UNREAD")).await;
        assert_eq!(gw.calls(), vec![("add".into(), "m1".into(), "UNREAD".into())]);
    }

    #[tokio::test]
    async fn move_to_replaces_folder_labels() {
        let gw = Arc::new(RecordingGateway::new());
        let outcomes = dispatch_one(Arc::clone(&gw), action("move_to", "SPAM")).await;
        assert!(outcomes[0].ok());
        assert_eq!(
            gw.calls(),
            vec![
                ("remove".into(), "m1".into(), "INBOX".into()),
                ("remove".into(), "m1".into(), "TRASH".into()),
                ("add".into(), "m1".into(), "SPAM".into()),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_destination_issues_no_gateway_calls() {
        let gw = Arc::new(RecordingGateway::new());
        let outcomes = dispatch_one(Arc::clone(&gw), action("move_to", "ARCHIVE")).await;
        assert!(!outcomes[0].ok());
        assert!(matches!(outcomes[0].result, Err(Error::Validation(_))));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_action_does_not_stop_later_actions() {
        // IMPORTANT add fails; the subsequent move_to must still run.
        let gw = Arc::new(RecordingGateway::failing_on("IMPORTANT"));
        let outcomes = ActionDispatcher::new(gw.clone())
            .dispatch(
                &message(),
                &[action("mark_as", "IMPORTANT"), action("move_to", "TRASH")],
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].ok());
        assert!(outcomes[1].ok());
        // 1 failed add + 2 removes + 1 add for the move
        assert_eq!(gw.calls().len(), 4);
    }

    #[tokio::test]
    async fn actions_execute_in_order() {
        let gw = Arc::new(RecordingGateway::new());
        ActionDispatcher::new(gw.clone())
            .dispatch(
                &message(),
                &[action("mark_as", "READ"), action("move_to", "INBOX")],
            )
            .await;
        let labels: Vec<String> = gw.calls().into_iter().map(|(_, _, l)| l).collect();
        assert_eq!(labels, vec!["UNREAD", "SPAM", "TRASH", "INBOX"]);
    }
}
