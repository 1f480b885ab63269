//! One reminder scan against the event store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::reminder::{TickReport, WINDOW_MINUTES};
use shared::{EventStore, Notifier, ReminderScanner, Result};
use tracing::info;

/// Span of fire times loaded per scan. Covers every fire time the due check
/// can accept at `now`.
pub fn candidate_window() -> Duration {
    Duration::minutes(WINDOW_MINUTES + 1)
}

/// Load the events whose reminders may fire at `now` and deliver them.
pub async fn run_scan<S, Tz, N>(
    store: &S,
    scanner: &mut ReminderScanner<Tz>,
    notifier: &N,
    now: DateTime<Utc>,
) -> Result<TickReport>
where
    S: EventStore + ?Sized,
    N: Notifier + ?Sized,
    Tz: TimeZone + Send + Sync,
    Tz::Offset: std::fmt::Display + Send + Sync,
{
    let candidates = store
        .list_reminder_candidates(now, now + candidate_window())
        .await?;
    info!(candidates = candidates.len(), "Loaded reminder candidates");

    let report = scanner.tick(&candidates, now, notifier).await;
    info!(
        events_scanned = report.events_scanned,
        reminders_due = report.reminders_due,
        system_deliveries = report.system_deliveries,
        in_app_deliveries = report.in_app_deliveries,
        suppressed = report.suppressed,
        errors = report.errors,
        "Reminder scan completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::{Account, AccountStore, MemoryStore, NewEvent, NotificationPermission, Reminder};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn permission(&self) -> NotificationPermission {
            NotificationPermission::Granted
        }

        fn request_permission(&self) {}

        async fn notify_system(&self, reminder: &Reminder) -> Result<()> {
            self.sent.lock().unwrap().push(reminder.body.clone());
            Ok(())
        }

        async fn notify_in_app(&self, _reminder: &Reminder) -> Result<()> {
            Ok(())
        }
    }

    async fn seeded_store(now: DateTime<Utc>) -> MemoryStore {
        let store = MemoryStore::new();
        let owner = store
            .insert_account(Account::new("scan@example.com", "hash".to_string()))
            .await
            .unwrap()
            .id;

        // (title, minutes from now to the event, reminder offset)
        for (title, minutes, offset) in [
            ("due now", 0, 0),
            ("due via offset", 45, 45),
            ("one minute out", 1, 0),
            ("too far", 5, 0),
            ("already past", -1, 0),
        ] {
            store
                .insert_event(
                    NewEvent {
                        owner,
                        title: title.to_string(),
                        description: String::new(),
                        date: now + Duration::minutes(minutes),
                        reminder_offset_minutes: offset,
                    }
                    .into_event(),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_scan_delivers_due_reminders() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let store = seeded_store(now).await;
        let notifier = RecordingNotifier::default();
        let mut scanner = ReminderScanner::new(Utc);

        let report = run_scan(&store, &mut scanner, &notifier, now).await.unwrap();
        assert_eq!(report.reminders_due, 3);
        assert_eq!(report.system_deliveries, 3);
        assert_eq!(report.errors, 0);

        let mut sent = notifier.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(
            sent,
            vec![
                "Upcoming event: due now at 9:00 AM",
                "Upcoming event: due via offset at 9:45 AM",
                "Upcoming event: one minute out at 9:01 AM",
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_dedup_across_ticks() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let store = seeded_store(now).await;
        let notifier = RecordingNotifier::default();
        let mut scanner = ReminderScanner::with_dedup(Utc);

        run_scan(&store, &mut scanner, &notifier, now - Duration::seconds(30))
            .await
            .unwrap();
        let second = run_scan(&store, &mut scanner, &notifier, now).await.unwrap();

        assert_eq!(second.system_deliveries, 0);
        assert_eq!(second.suppressed, 3);
        assert_eq!(notifier.sent.lock().unwrap().len(), 3);
    }
}
