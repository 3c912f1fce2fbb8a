//! expense-extractor - extract one expense from text and print it as JSON.
//!
//! ```text
//! expense-extractor "Lunch 250 at SpiceHub yesterday"
//! echo "20rs na padika" | expense-extractor
//! ```
//!
//! Exit codes: 0 valid expense, 1 invalid result or extraction failure,
//! 2 configuration error, 3 extraction succeeded but was not recorded.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use expense_extractor::adapters::{
    HttpProviderFactory, InMemoryCredentialStore, InMemoryRecordStore, InMemorySettingsStore,
    InMemoryTaxonomyStore, PostgresRecordStore, YamlTaxonomyStore,
};
use expense_extractor::application::{
    ExtractExpenseConfig, ExtractExpenseError, ExtractExpenseHandler, ModelInvoker, RetryPolicy,
};
use expense_extractor::config::AppConfig;
use expense_extractor::domain::taxonomy::TaxonomySnapshot;
use expense_extractor::ports::{RecordStore, TaxonomyStore};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {}", err);
            return ExitCode::from(2);
        }
    };
    config.logging.init();

    if let Err(err) = config.validate() {
        tracing::error!(error = %err, "invalid configuration");
        return ExitCode::from(2);
    }

    let input = match read_input() {
        Ok(input) => input,
        Err(err) => {
            tracing::error!(error = %err, "failed to read input");
            return ExitCode::from(1);
        }
    };

    let handler = match build_handler(&config).await {
        Ok(handler) => handler,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to the database");
            return ExitCode::from(2);
        }
    };

    match handler.extract_with_stores(&input).await {
        Ok(outcome) => {
            print_json(&outcome);
            if outcome.result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(err) => report_failure(&err),
    }
}

/// Input is the joined arguments, or stdin when none are given.
fn read_input() -> std::io::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

async fn build_handler(config: &AppConfig) -> Result<ExtractExpenseHandler, sqlx::Error> {
    let records: Arc<dyn RecordStore> = match &config.database {
        Some(database) => Arc::new(PostgresRecordStore::new(database.connect().await?)),
        None => {
            tracing::warn!("no database configured, attempt logs are kept in memory only");
            Arc::new(InMemoryRecordStore::new())
        }
    };

    // An empty in-memory taxonomy resolves to the default taxonomy.
    let taxonomy: Arc<dyn TaxonomyStore> = match &config.extraction.taxonomy_file {
        Some(path) => Arc::new(YamlTaxonomyStore::new(path)),
        None => Arc::new(InMemoryTaxonomyStore::new(TaxonomySnapshot::new())),
    };

    let invoker = ModelInvoker::new(
        RetryPolicy::new(config.ai.max_retries, config.ai.base_delay()),
        config.ai.timeout(),
    );

    Ok(ExtractExpenseHandler::new(
        Arc::new(HttpProviderFactory::from_config(&config.ai)),
        Arc::new(InMemoryCredentialStore::from_config(&config.ai)),
        taxonomy,
        Arc::new(InMemorySettingsStore::new(config.ai.default_settings())),
        records,
    )
    .with_invoker(invoker)
    .with_config(ExtractExpenseConfig::from_app_config(config)))
}

fn report_failure(err: &ExtractExpenseError) -> ExitCode {
    tracing::error!(error = %err, "extraction failed");
    match err {
        ExtractExpenseError::Persistence {
            result,
            attempt_log_id,
            message,
        } => {
            print_json(&serde_json::json!({
                "error": message,
                "recorded": false,
                "attempt_log_id": attempt_log_id,
                "result": result,
            }));
            ExitCode::from(3)
        }
        ExtractExpenseError::Configuration(_) => {
            print_json(&serde_json::json!({ "error": err.to_string() }));
            ExitCode::from(2)
        }
        _ => {
            print_json(&serde_json::json!({ "error": err.to_string() }));
            ExitCode::from(1)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => tracing::error!(error = %err, "failed to serialize output"),
    }
}
