use std::sync::Arc;

use inbox_rules::config::{Config, SourceKind};
use inbox_rules::dispatch::ActionDispatcher;
use inbox_rules::gateway::GmailClient;
use inbox_rules::rules::{Rule, RuleEngine};
use inbox_rules::runner::AutomationRunner;
use inbox_rules::source::{MessageSource, StoreSource};
use inbox_rules::store::{Database, MessageStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let rule_path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: inbox-rules <rule.json>");
        eprintln!("  GMAIL_ACCESS_TOKEN    required");
        eprintln!("  GMAIL_LABEL_FILTER    default INBOX");
        eprintln!("  INBOX_RULES_DB_PATH   enables the local mirror");
        eprintln!("  INBOX_RULES_SOURCE    live (default) or store");
        std::process::exit(1);
    });

    let config = Config::from_env()?;
    let rule = Rule::from_json_file(&rule_path)?;

    eprintln!("📬 inbox-rules v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Rule: {} ({} file)", rule.name, rule_path);
    eprintln!(
        "   Source: {}",
        match config.source {
            SourceKind::Live => "live Gmail API",
            SourceKind::Store => "local mirror",
        }
    );

    let client = Arc::new(GmailClient::from_config(&config));

    let store = match &config.db_path {
        Some(path) => {
            eprintln!("   Mirror: {}", path.display());
            let db = Arc::new(Database::open(path)?);
            Some(Arc::new(MessageStore::new(db)))
        }
        None => None,
    };

    let source: Arc<dyn MessageSource> = match config.source {
        SourceKind::Live => Arc::clone(&client) as Arc<dyn MessageSource>,
        SourceKind::Store => {
            // Validated in Config::from_env: store source requires a DB path.
            let store = store.clone().expect("store source requires a DB path");
            Arc::new(StoreSource::new(store))
        }
    };

    let engine = RuleEngine::new(rule);
    let dispatcher = ActionDispatcher::new(client);
    let mut runner = AutomationRunner::new(source, engine, dispatcher);

    // Mirror live fetches so a later run can use INBOX_RULES_SOURCE=store.
    if config.source == SourceKind::Live {
        if let Some(store) = store {
            runner = runner.with_mirror(store);
        }
    }

    let outcomes = runner.run().await?;

    let matched = outcomes.iter().filter(|o| o.matched).count();
    let failed = outcomes.iter().filter(|o| o.has_failure()).count();
    let actions: usize = outcomes
        .iter()
        .map(|o| o.actions.iter().filter(|a| a.ok()).count())
        .sum();

    eprintln!(
        "\n   {} message(s) evaluated: {} matched, {} action(s) applied, {} failure(s)",
        outcomes.len(),
        matched,
        actions,
        failed,
    );

    Ok(())
}
