//! Reminder Scanner Lambda - Delivers reminders that fire this minute.
//!
//! This Lambda runs once a minute via EventBridge and:
//! 1. Loads events whose reminder time falls in the next window
//! 2. Keeps the ones that are due now
//! 3. Publishes each reminder to SNS, or logs it when no topic is configured

use std::sync::Arc;

use aws_sdk_sns::Client as SnsClient;
use chrono::Utc;
use chrono_tz::Tz;
use event_triggers::{run_scan, SnsNotifier};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Deserialize;
use shared::db::PgStore;
use shared::reminder::TickReport;
use shared::{Config, ReminderScanner};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct ScheduledEvent {
    #[serde(default, rename = "detail-type")]
    detail_type: String,
}

struct AppState {
    store: PgStore,
    notifier: SnsNotifier,
    scanner: Mutex<ReminderScanner<Tz>>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let store = PgStore::connect(&config).await?;
        let notifier = SnsNotifier::new(
            SnsClient::new(&aws_config),
            config.notification_topic_arn.clone(),
        );
        // Warm containers keep the dedup set between invocations.
        let scanner = if config.reminder_dedup {
            ReminderScanner::with_dedup(config.display_timezone)
        } else {
            ReminderScanner::new(config.display_timezone)
        };

        Ok(Self {
            store,
            notifier,
            scanner: Mutex::new(scanner),
        })
    }
}

async fn handler(
    state: Arc<AppState>,
    event: LambdaEvent<ScheduledEvent>,
) -> Result<TickReport, Error> {
    info!(detail_type = %event.payload.detail_type, "Starting reminder scan");

    let mut scanner = state.scanner.lock().await;
    let report = run_scan(&state.store, &mut *scanner, &state.notifier, Utc::now()).await?;

    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    let state_clone = state.clone();

    run(service_fn(move |event| {
        let state = state_clone.clone();
        async move { handler(state, event).await }
    }))
    .await
}
