//! Integration tests for the extraction pipeline.
//!
//! Drives `ExtractExpenseHandler` end to end with the mock provider,
//! in-memory stores, a fixed clock and a recording sleeper.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use expense_extractor::adapters::ai::{MockAIProvider, MockError, StaticProviderFactory};
use expense_extractor::adapters::memory::{
    InMemoryCredentialStore, InMemoryRecordStore, InMemorySettingsStore, InMemoryTaxonomyStore,
};
use expense_extractor::application::{
    ExtractExpenseError, ExtractExpenseHandler, ModelInvoker, RecordingSleeper, RetryPolicy,
};
use expense_extractor::domain::extraction::{
    ist, AiSettings, ExtractionField, ParsePath, Provider, UNPARSEABLE_REASON,
};
use expense_extractor::domain::foundation::Timestamp;
use expense_extractor::domain::taxonomy::TaxonomySnapshot;
use expense_extractor::ports::FixedClock;

// =============================================================================
// Fixtures
// =============================================================================

struct Pipeline {
    handler: ExtractExpenseHandler,
    provider: MockAIProvider,
    records: Arc<InMemoryRecordStore>,
    sleeper: Arc<RecordingSleeper>,
}

/// 2024-03-15 12:00 IST.
fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Timestamp::from_datetime(
        Utc.with_ymd_and_hms(2024, 3, 15, 6, 30, 0).unwrap(),
    )))
}

fn food_and_transport() -> TaxonomySnapshot {
    TaxonomySnapshot::new()
        .with_category("Food", ["Dining", "Snacks"])
        .with_category("Transport", ["Bus", "Taxi"])
}

fn openai() -> AiSettings {
    AiSettings::new(Provider::OpenAI, "gpt-4o-mini", 512)
}

fn pipeline_with(provider: MockAIProvider, records: InMemoryRecordStore) -> Pipeline {
    let records = Arc::new(records);
    let sleeper = Arc::new(RecordingSleeper::new());
    let handler = ExtractExpenseHandler::new(
        Arc::new(StaticProviderFactory::new(Arc::new(provider.clone()))),
        Arc::new(
            InMemoryCredentialStore::new()
                .with_key(Provider::OpenAI, "sk-test")
                .with_key(Provider::Gemini, "g-test"),
        ),
        Arc::new(InMemoryTaxonomyStore::new(food_and_transport())),
        Arc::new(InMemorySettingsStore::new(openai())),
        records.clone(),
    )
    .with_clock(fixed_clock())
    .with_invoker(
        ModelInvoker::new(
            RetryPolicy::new(3, Duration::from_millis(100)),
            Duration::from_secs(5),
        )
        .with_sleeper(sleeper.clone()),
    );

    Pipeline {
        handler,
        provider,
        records,
        sleeper,
    }
}

fn pipeline(provider: MockAIProvider) -> Pipeline {
    pipeline_with(provider, InMemoryRecordStore::new())
}

fn model_json(
    amount: &str,
    category: &str,
    subcategory: &str,
    description: &str,
    datetime: &str,
) -> String {
    format!(
        r#"{{"valid": true, "amount": {}, "category": {}, "subcategory": {}, "description": "{}", "datetime": {}, "missing_fields": [], "reason": null}}"#,
        amount, category, subcategory, description, datetime
    )
}

// =============================================================================
// Behavior
// =============================================================================

#[tokio::test]
async fn full_match_yields_valid_expense_dated_yesterday() {
    let input = "Lunch 250 at SpiceHub yesterday";
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "250",
        r#""Food""#,
        r#""Dining""#,
        input,
        r#""2024-03-14T12:00:00+05:30""#,
    )));

    let outcome = p
        .handler
        .extract(input, &openai(), food_and_transport())
        .await
        .unwrap();
    let result = &outcome.result;

    assert!(result.valid);
    assert_eq!(result.amount, Some(Decimal::from(250)));
    assert_eq!(result.category.as_deref(), Some("Food"));
    assert_eq!(result.subcategory.as_deref(), Some("Dining"));
    assert_eq!(result.description.as_deref(), Some(input));

    let datetime = result.datetime.unwrap();
    assert_eq!(datetime.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    assert_eq!(*datetime.offset(), ist());

    assert!(!outcome.low_confidence_datetime);
    assert_eq!(p.records.expenses().len(), 1);
}

#[tokio::test]
async fn missing_amount_is_reported() {
    let p = pipeline(MockAIProvider::new().with_response(
        r#"{"valid": false, "amount": null, "category": "Food", "subcategory": "Dining",
            "description": "Lunch at SpiceHub yesterday", "datetime": null,
            "missing_fields": ["amount"], "reason": "no amount given"}"#,
    ));

    let outcome = p
        .handler
        .extract("Lunch at SpiceHub yesterday", &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(!outcome.result.valid);
    assert!(outcome.result.is_missing(ExtractionField::Amount));
    assert_eq!(outcome.result.reason.as_deref(), Some("no amount given"));
    assert!(outcome.expense_id.is_none());
}

#[tokio::test]
async fn invented_category_is_rejected() {
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "500",
        r#""Entertainment""#,
        r#""Movies""#,
        "movie 500",
        "null",
    )));

    let outcome = p
        .handler
        .extract("movie 500", &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(!outcome.result.valid);
    assert!(outcome.result.is_missing(ExtractionField::Category));
    assert!(p.records.expenses().is_empty());
}

#[tokio::test]
async fn free_text_output_is_unparseable_not_an_error() {
    let p = pipeline(
        MockAIProvider::new().with_response("Sorry, I could not find an expense in that message."),
    );

    let outcome = p
        .handler
        .extract("hello there", &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(!outcome.result.valid);
    assert_eq!(outcome.result.reason.as_deref(), Some(UNPARSEABLE_REASON));
    assert_eq!(outcome.parse_path, ParsePath::Unparseable);

    let attempts = p.records.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(
        attempts[0].raw_output.as_deref(),
        Some("Sorry, I could not find an expense in that message.")
    );
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "-50",
        r#""Transport""#,
        r#""Bus""#,
        "bus -50",
        "null",
    )));

    let outcome = p
        .handler
        .extract("bus -50", &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(!outcome.result.valid);
    assert!(outcome.result.is_missing(ExtractionField::Amount));
}

#[tokio::test]
async fn gemini_output_with_prose_uses_fallback_path() {
    let p = pipeline(MockAIProvider::new().with_response(format!(
        "Here is the expense:\n```json\n{}\n```",
        model_json("20", r#""food""#, r#""snacks""#, "20rs na padika", "null")
    )));
    let gemini = AiSettings::new(Provider::Gemini, "gemini-1.5-flash", 512);

    let outcome = p
        .handler
        .extract("20rs na padika", &gemini, food_and_transport())
        .await
        .unwrap();

    assert_eq!(outcome.parse_path, ParsePath::Fallback);
    assert!(outcome.result.valid);
    assert_eq!(outcome.result.category.as_deref(), Some("Food"));
    assert_eq!(outcome.result.subcategory.as_deref(), Some("Snacks"));
    // No datetime from the model: the request anchor is used.
    assert_eq!(
        outcome.result.datetime.unwrap().date_naive(),
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    );
}

#[tokio::test]
async fn structured_provider_uses_structured_path_with_zero_temperature() {
    let p = pipeline(
        MockAIProvider::new()
            .with_structured_output(true)
            .with_response(model_json("15", r#""Transport""#, r#""Bus""#, "bus 15", "null")),
    );

    let outcome = p
        .handler
        .extract("bus 15", &openai(), food_and_transport())
        .await
        .unwrap();

    assert_eq!(outcome.parse_path, ParsePath::Structured);
    let calls = p.provider.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].temperature, Some(0.0));
    assert!(calls[0].response_schema.is_some());
    assert_eq!(calls[0].user_content().map(|c| c.ends_with("Input: bus 15")), Some(true));
}

#[tokio::test]
async fn transient_failures_are_retried_with_backoff() {
    let p = pipeline(
        MockAIProvider::new()
            .with_error(MockError::Network {
                message: "connection reset".to_string(),
            })
            .with_error(MockError::Timeout { timeout_secs: 5 })
            .with_response(model_json("15", r#""Transport""#, r#""Bus""#, "bus 15", "null")),
    );

    let outcome = p
        .handler
        .extract("bus 15", &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(outcome.result.valid);
    assert_eq!(p.provider.call_count(), 3);
    assert_eq!(
        p.sleeper.waits(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert_eq!(p.records.attempts().len(), 1);
}

#[tokio::test]
async fn invalid_model_is_a_configuration_error_without_retry() {
    let p = pipeline(MockAIProvider::new().with_error(MockError::InvalidModel {
        model: "gpt-4o-mini".to_string(),
    }));

    let err = p
        .handler
        .extract("bus 15", &openai(), food_and_transport())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractExpenseError::Configuration(_)));
    assert!(!err.is_persistence_failure());
    assert_eq!(p.provider.call_count(), 1);
    assert!(p.sleeper.waits().is_empty());
}

#[tokio::test]
async fn past_default_for_ambiguous_day_is_flagged() {
    let input = "kal bus ma 50";
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "50",
        r#""Transport""#,
        r#""Bus""#,
        input,
        r#""2024-03-14T12:00:00+05:30""#,
    )));

    let outcome = p
        .handler
        .extract(input, &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(outcome.result.valid);
    assert!(outcome.low_confidence_datetime);
    assert!(p.records.attempts()[0].low_confidence_datetime);
}

#[tokio::test]
async fn ambiguous_day_resolved_to_future_by_context_is_not_flagged() {
    let input = "kal bus ma 50 jaish";
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "50",
        r#""Transport""#,
        r#""Bus""#,
        input,
        r#""2024-03-16T12:00:00+05:30""#,
    )));

    let outcome = p
        .handler
        .extract(input, &openai(), food_and_transport())
        .await
        .unwrap();

    let datetime = outcome.result.datetime.unwrap();
    assert_eq!(datetime.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    assert!(!outcome.low_confidence_datetime);
    assert!(!p.records.attempts()[0].low_confidence_datetime);
}

#[tokio::test]
async fn english_word_matching_lexicon_is_not_flagged() {
    let input = "Kale salad 200";
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "200",
        r#""Food""#,
        r#""Snacks""#,
        input,
        "null",
    )));

    let outcome = p
        .handler
        .extract(input, &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(outcome.result.valid);
    assert!(!outcome.low_confidence_datetime);
}

#[tokio::test]
async fn model_refusal_is_an_invalid_result_not_an_error() {
    let refusal = "I'm sorry, I can't help with that.";
    let p = pipeline(MockAIProvider::new().with_error(MockError::ContentFiltered {
        reason: refusal.to_string(),
    }));

    let outcome = p
        .handler
        .extract("Lunch 250", &openai(), food_and_transport())
        .await
        .unwrap();

    assert!(!outcome.result.valid);
    assert_eq!(outcome.result.reason.as_deref(), Some(refusal));
    assert_eq!(outcome.result.missing_fields, ExtractionField::REQUIRED.to_vec());
    assert!(outcome.expense_id.is_none());
    assert_eq!(p.provider.call_count(), 1);
    assert!(p.sleeper.waits().is_empty());

    let attempts = p.records.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].raw_output.as_deref(), Some(refusal));
    assert_eq!(attempts[0].parse_path, Some(ParsePath::Unparseable));
}

#[tokio::test]
async fn every_path_logs_exactly_one_attempt() {
    let outputs = vec![
        MockAIProvider::new().with_response(model_json(
            "250",
            r#""Food""#,
            r#""Dining""#,
            "Lunch 250",
            "null",
        )),
        MockAIProvider::new().with_response("not json at all"),
        MockAIProvider::new().with_response(model_json("250", "null", "null", "Lunch 250", "null")),
        MockAIProvider::new().with_error(MockError::AuthenticationFailed),
        MockAIProvider::new()
            .with_error(MockError::Unavailable {
                message: "down".to_string(),
            })
            .with_error(MockError::Unavailable {
                message: "down".to_string(),
            })
            .with_error(MockError::Unavailable {
                message: "down".to_string(),
            }),
        MockAIProvider::new().with_error(MockError::ContentFiltered {
            reason: "refused".to_string(),
        }),
    ];

    for provider in outputs {
        let p = pipeline(provider);
        let _ = p
            .handler
            .extract("Lunch 250", &openai(), food_and_transport())
            .await;
        assert_eq!(p.records.attempts().len(), 1);
    }

    let p = pipeline(MockAIProvider::new());
    let _ = p.handler.extract("", &openai(), food_and_transport()).await;
    assert_eq!(p.records.attempts().len(), 1);
}

#[tokio::test]
async fn identical_requests_give_identical_results() {
    let response = model_json("250", r#""Food""#, r#""Dining""#, "Lunch 250", "null");
    let p = pipeline(
        MockAIProvider::new()
            .with_response(response.clone())
            .with_response(response),
    );

    let first = p
        .handler
        .extract("Lunch 250", &openai(), food_and_transport())
        .await
        .unwrap();
    let second = p
        .handler
        .extract("Lunch 250", &openai(), food_and_transport())
        .await
        .unwrap();

    assert_eq!(first.result, second.result);
    assert_ne!(first.attempt_log_id, second.attempt_log_id);

    let attempts = p.records.attempts();
    assert_eq!(attempts[0].settings, attempts[1].settings);
    assert_eq!(attempts[0].settings.temperature, 0.0);
}

#[tokio::test]
async fn unrecorded_success_is_distinguishable_from_failed_extraction() {
    let p = pipeline_with(
        MockAIProvider::new().with_response(model_json(
            "250",
            r#""Food""#,
            r#""Dining""#,
            "Lunch 250",
            "null",
        )),
        InMemoryRecordStore::new().failing_expenses(),
    );

    let err = p
        .handler
        .extract("Lunch 250", &openai(), food_and_transport())
        .await
        .unwrap_err();

    assert!(err.is_persistence_failure());
    if let ExtractExpenseError::Persistence { result, .. } = err {
        assert!(result.valid);
        assert_eq!(result.amount, Some(Decimal::from(250)));
    }
    assert_eq!(p.records.attempts().len(), 1);
}

#[tokio::test]
async fn empty_taxonomy_uses_default_categories() {
    let p = pipeline(MockAIProvider::new().with_response(model_json(
        "250",
        r#""Food""#,
        r#""Dining""#,
        "Lunch 250",
        "null",
    )));

    let outcome = p
        .handler
        .extract("Lunch 250", &openai(), TaxonomySnapshot::new())
        .await
        .unwrap();

    let default = TaxonomySnapshot::minimal_default();
    assert!(default.contains_pair("Food", "Dining"));
    assert!(outcome.result.valid);
    let prompt = p.provider.get_calls()[0].system_prompt.clone().unwrap_or_default();
    for category in default.categories() {
        assert!(prompt.contains(&category.name));
    }
}
