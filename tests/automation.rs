//! End-to-end automation runs against mock collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use inbox_rules::dispatch::ActionDispatcher;
use inbox_rules::error::{Error, GatewayError};
use inbox_rules::gateway::MailboxGateway;
use inbox_rules::message::Message;
use inbox_rules::rules::{Rule, RuleEngine};
use inbox_rules::runner::AutomationRunner;
use inbox_rules::source::{MessageSource, StoreSource};
use inbox_rules::store::{Database, MessageStore};

// ── Mock collaborators ──────────────────────────────────────────────

struct FixedSource {
    messages: Vec<Message>,
}

#[async_trait]
impl MessageSource for FixedSource {
    async fn list_message_ids(&self) -> Result<Vec<String>, Error> {
        Ok(self.messages.iter().map(|m| m.id.clone()).collect())
    }

    async fn get_message(&self, id: &str) -> Result<Message, Error> {
        Ok(self
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .expect("test source only lists known ids"))
    }
}

#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<(String, String, String)>>,
}

impl RecordingGateway {
    fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailboxGateway for RecordingGateway {
    async fn add_label(&self, id: &str, label: &str) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(("add".into(), id.into(), label.into()));
        Ok(())
    }

    async fn remove_label(&self, id: &str, label: &str) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(("remove".into(), id.into(), label.into()));
        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn message(id: &str, from: &str, subject: &str, days_ago: i64) -> Message {
    Message {
        id: id.into(),
        from: from.into(),
        to: "me@example.com".into(),
        subject: subject.into(),
        date_received: Utc::now() - Duration::days(days_ago),
        raw_labels: Default::default(),
    }
}

fn rule_from_json(json: &str) -> Rule {
    serde_json::from_str(json).expect("valid rule json")
}

fn runner(
    messages: Vec<Message>,
    rule: Rule,
) -> (AutomationRunner, Arc<RecordingGateway>) {
    let gateway = Arc::new(RecordingGateway::default());
    let runner = AutomationRunner::new(
        Arc::new(FixedSource { messages }),
        RuleEngine::new(rule),
        ActionDispatcher::new(Arc::clone(&gateway) as Arc<dyn MailboxGateway>),
    );
    (runner, gateway)
}

const INVOICE_RULE: &str = r#"{
    "name": "Flag invoices",
    "conditional_predicate": "ALL",
    "conditions": [
        { "field": "subject", "predicate": "contains", "value": "invoice" }
    ],
    "actions": [
        { "action": "mark_as", "value": "IMPORTANT" }
    ]
}"#;

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn matching_subject_marks_important() {
    let (runner, gateway) = runner(
        vec![message("m1", "billing@vendor.com", "Your invoice #12", 0)],
        rule_from_json(INVOICE_RULE),
    );

    let outcomes = runner.run().await.unwrap();
    assert!(outcomes[0].matched);
    assert_eq!(
        gateway.calls(),
        vec![("add".to_string(), "m1".to_string(), "IMPORTANT".to_string())]
    );
}

#[tokio::test]
async fn non_matching_subject_issues_no_calls() {
    let (runner, gateway) = runner(
        vec![message("m1", "billing@vendor.com", "Hello", 0)],
        rule_from_json(INVOICE_RULE),
    );

    let outcomes = runner.run().await.unwrap();
    assert!(!outcomes[0].matched);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn any_rule_matches_on_second_condition() {
    let rule = rule_from_json(
        r#"{
            "name": "Spam catcher",
            "conditional_predicate": "ANY",
            "conditions": [
                { "field": "from", "predicate": "contains", "value": "spam@x" },
                { "field": "subject", "predicate": "contains", "value": "win prize" }
            ],
            "actions": [
                { "action": "move_to", "value": "SPAM" }
            ]
        }"#,
    );
    let engine = RuleEngine::new(rule.clone());
    let msg = message("m1", "stranger@y.com", "You win prize money!", 0);

    // Condition 1 evaluated false, condition 2 true, then stop.
    let eval = engine.evaluate(&msg, Utc::now()).unwrap();
    assert!(eval.matched);
    assert_eq!(eval.conditions_checked, 2);

    let (runner, gateway) = runner(vec![msg], rule);
    let outcomes = runner.run().await.unwrap();
    assert!(outcomes[0].matched);
    assert_eq!(
        gateway.calls(),
        vec![
            ("remove".to_string(), "m1".to_string(), "INBOX".to_string()),
            ("remove".to_string(), "m1".to_string(), "TRASH".to_string()),
            ("add".to_string(), "m1".to_string(), "SPAM".to_string()),
        ]
    );
}

#[tokio::test]
async fn date_window_rule_filters_by_age() {
    let rule = rule_from_json(
        r#"{
            "name": "Recent mail",
            "conditional_predicate": "ALL",
            "conditions": [
                { "field": "date_received", "predicate": "lte", "value": 2 }
            ],
            "actions": [
                { "action": "mark_as", "value": "UNREAD" }
            ]
        }"#,
    );

    let (runner, gateway) = runner(
        vec![
            message("fresh", "a@x.com", "one day old", 1),
            message("stale", "a@x.com", "five days old", 5),
        ],
        rule,
    );

    let outcomes = runner.run().await.unwrap();
    assert!(outcomes[0].matched);
    assert!(!outcomes[1].matched);
    assert_eq!(
        gateway.calls(),
        vec![("add".to_string(), "fresh".to_string(), "UNREAD".to_string())]
    );
}

#[tokio::test]
async fn invalid_destination_fails_without_gateway_calls() {
    let rule = rule_from_json(
        r#"{
            "name": "Bad destination",
            "conditional_predicate": "ALL",
            "conditions": [],
            "actions": [
                { "action": "move_to", "value": "ARCHIVE" }
            ]
        }"#,
    );

    // Zero conditions under ALL: matches vacuously, so the action is
    // attempted — and rejected by validation before any call.
    let (runner, gateway) = runner(vec![message("m1", "a@x.com", "s", 0)], rule);
    let outcomes = runner.run().await.unwrap();

    assert!(outcomes[0].matched);
    assert!(outcomes[0].has_failure());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn multiple_actions_apply_in_order() {
    let rule = rule_from_json(
        r#"{
            "name": "Read and file",
            "conditional_predicate": "ALL",
            "conditions": [
                { "field": "from", "predicate": "contains", "value": "newsletter@" }
            ],
            "actions": [
                { "action": "mark_as", "value": "READ" },
                { "action": "move_to", "value": "TRASH" }
            ]
        }"#,
    );

    let (runner, gateway) = runner(
        vec![message("m1", "newsletter@shop.com", "Deals!", 0)],
        rule,
    );
    let outcomes = runner.run().await.unwrap();
    assert!(outcomes[0].matched);
    assert_eq!(outcomes[0].actions.len(), 2);

    let labels: Vec<String> = gateway.calls().into_iter().map(|(_, _, l)| l).collect();
    assert_eq!(labels, vec!["UNREAD", "INBOX", "SPAM", "TRASH"]);
}

#[tokio::test]
async fn store_backed_source_runs_rules_over_mirrored_rows() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = Arc::new(MessageStore::new(db));
    store
        .upsert(
            "g1",
            "Your invoice #99",
            "billing@vendor.com",
            "me@example.com",
            Utc::now(),
        )
        .unwrap();
    store
        .upsert(
            "g2",
            "Team lunch",
            "friend@work.com",
            "me@example.com",
            Utc::now(),
        )
        .unwrap();

    let gateway = Arc::new(RecordingGateway::default());
    let runner = AutomationRunner::new(
        Arc::new(StoreSource::new(store)),
        RuleEngine::new(rule_from_json(INVOICE_RULE)),
        ActionDispatcher::new(Arc::clone(&gateway) as Arc<dyn MailboxGateway>),
    );

    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].matched);
    assert!(!outcomes[1].matched);
    assert_eq!(
        gateway.calls(),
        vec![("add".to_string(), "g1".to_string(), "IMPORTANT".to_string())]
    );
}
