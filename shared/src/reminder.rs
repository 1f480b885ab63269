//! Reminder scanning and dispatch.
//!
//! A scan is a pure decision over `(now, events)`: an event is due when its
//! fire time `date - reminder offset` is not in the past and at most one whole
//! minute ahead of `now`. The scanner runs once per [`POLL_INTERVAL`], so an
//! event can be seen in two consecutive ticks; [`ReminderScanner`] can keep a
//! per-process set of already notified ids to suppress the repeat.
//!
//! Delivery goes through a [`Notifier`]: system notification when permission
//! is granted, an in-app message otherwise or when the system path fails.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Event;
use crate::Result;

/// How often the scanner is expected to run.
pub const POLL_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Width of the firing window in whole minutes.
pub const WINDOW_MINUTES: i64 = 1;

/// Title used for every reminder notification.
pub const NOTIFICATION_TITLE: &str = "Event Reminder";

/// When the reminder for `event` should fire.
pub fn fire_at(event: &Event) -> DateTime<Utc> {
    event.date - Duration::minutes(i64::from(event.reminder_offset_minutes))
}

/// Whether `event` fires in the tick at `now`.
pub fn is_due(event: &Event, now: DateTime<Utc>) -> bool {
    let fire_at = fire_at(event);
    fire_at >= now && (fire_at - now).num_minutes() <= WINDOW_MINUTES
}

/// Events that fire at `now`, in input order.
pub fn due_events(events: &[Event], now: DateTime<Utc>) -> Vec<&Event> {
    events.iter().filter(|e| is_due(e, now)).collect()
}

/// A notification ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub event_id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
}

impl Reminder {
    /// Build the notification for `event`, formatting its time in `tz`.
    pub fn for_event<Tz: TimeZone>(event: &Event, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let local = event.date.with_timezone(tz);
        Self {
            event_id: event.id,
            owner: event.owner,
            title: NOTIFICATION_TITLE.to_string(),
            body: format!(
                "Upcoming event: {} at {}",
                event.title,
                local.format("%-I:%M %p")
            ),
            fire_at: fire_at(event),
        }
    }
}

/// Whether system notifications may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

/// How a reminder ended up being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    System,
    InApp,
}

/// Notification capability injected into the scanner.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;

    /// Ask for permission. Must not block; the answer may arrive later.
    fn request_permission(&self);

    async fn notify_system(&self, reminder: &Reminder) -> Result<()>;

    async fn notify_in_app(&self, reminder: &Reminder) -> Result<()>;
}

/// Deliver one reminder, falling back to the in-app path.
pub async fn dispatch<N: Notifier + ?Sized>(notifier: &N, reminder: &Reminder) -> Result<Delivery> {
    if notifier.permission() == NotificationPermission::Default {
        notifier.request_permission();
    }

    if notifier.permission() == NotificationPermission::Granted {
        match notifier.notify_system(reminder).await {
            Ok(()) => return Ok(Delivery::System),
            Err(e) => {
                warn!(event_id = %reminder.event_id, error = %e, "System notification failed, falling back to in-app");
            }
        }
    }

    notifier.notify_in_app(reminder).await?;
    Ok(Delivery::InApp)
}

/// Outcome of one scanner tick.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub events_scanned: u32,
    pub reminders_due: u32,
    pub system_deliveries: u32,
    pub in_app_deliveries: u32,
    pub suppressed: u32,
    pub errors: u32,
}

/// Runs the due check and dispatch for one tick at a time.
pub struct ReminderScanner<Tz: TimeZone> {
    tz: Tz,
    /// Notified event ids with the fire time they were sent for.
    notified: Option<HashMap<Uuid, DateTime<Utc>>>,
}

impl<Tz> ReminderScanner<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: std::fmt::Display + Send + Sync,
{
    /// Scanner without repeat suppression.
    pub fn new(tz: Tz) -> Self {
        Self { tz, notified: None }
    }

    /// Scanner that notifies each event id at most once.
    pub fn with_dedup(tz: Tz) -> Self {
        Self {
            tz,
            notified: Some(HashMap::new()),
        }
    }

    /// Reminders due at `now`, skipping ids already notified.
    pub fn due(&self, events: &[Event], now: DateTime<Utc>) -> Vec<Reminder> {
        due_events(events, now)
            .into_iter()
            .filter(|e| !self.already_notified(e.id))
            .map(|e| Reminder::for_event(e, &self.tz))
            .collect()
    }

    fn already_notified(&self, id: Uuid) -> bool {
        self.notified.as_ref().is_some_and(|sent| sent.contains_key(&id))
    }

    /// Number of ids held for repeat suppression.
    pub fn remembered(&self) -> usize {
        self.notified.as_ref().map_or(0, HashMap::len)
    }

    /// Forget ids whose fire time is before `now`; they cannot be due again.
    fn prune(&mut self, now: DateTime<Utc>) {
        if let Some(sent) = self.notified.as_mut() {
            sent.retain(|_, fire_at| *fire_at >= now);
        }
    }

    /// Scan `events` at `now` and deliver every due reminder.
    pub async fn tick<N: Notifier + ?Sized>(
        &mut self,
        events: &[Event],
        now: DateTime<Utc>,
        notifier: &N,
    ) -> TickReport {
        self.prune(now);
        let due = due_events(events, now);
        let mut report = TickReport {
            events_scanned: u32::try_from(events.len()).unwrap_or(u32::MAX),
            reminders_due: u32::try_from(due.len()).unwrap_or(u32::MAX),
            ..TickReport::default()
        };

        for event in due {
            if self.already_notified(event.id) {
                debug!(event_id = %event.id, "Reminder already sent");
                report.suppressed += 1;
                continue;
            }

            let reminder = Reminder::for_event(event, &self.tz);
            match dispatch(notifier, &reminder).await {
                Ok(Delivery::System) => report.system_deliveries += 1,
                Ok(Delivery::InApp) => report.in_app_deliveries += 1,
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "Failed to deliver reminder");
                    report.errors += 1;
                    continue;
                }
            }

            if let Some(sent) = self.notified.as_mut() {
                sent.insert(event.id, reminder.fire_at);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEvent;
    use crate::Error;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn event_at(title: &str, hour: u32, minute: u32, offset: i32) -> Event {
        NewEvent {
            owner: Uuid::nil(),
            title: title.to_string(),
            description: String::new(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap(),
            reminder_offset_minutes: offset,
        }
        .into_event()
    }

    fn ten_o_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_window_boundaries() {
        let now = ten_o_clock();
        assert!(!is_due(&event_at("past", 10, 14, 15), now));
        assert!(is_due(&event_at("now", 10, 15, 15), now));
        assert!(is_due(&event_at("one minute", 10, 16, 15), now));
        assert!(!is_due(&event_at("two minutes", 10, 17, 15), now));
    }

    #[test]
    fn test_partial_minutes_truncate() {
        let now = ten_o_clock();
        let mut event = event_at("almost two", 10, 1, 0);
        event.date = event.date + Duration::seconds(59);
        assert!(is_due(&event, now));

        let mut event = event_at("just past", 10, 0, 0);
        event.date = event.date - Duration::seconds(1);
        assert!(!is_due(&event, now));
    }

    #[test]
    fn test_due_events_keeps_input_order_and_does_not_mutate() {
        let now = ten_o_clock();
        let events = vec![
            event_at("b", 10, 16, 15),
            event_at("skip", 11, 0, 0),
            event_at("a", 10, 0, 0),
        ];
        let snapshot = events.clone();
        let titles: Vec<&str> = due_events(&events, now).iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(events, snapshot);
    }

    #[test]
    fn test_reminder_body_uses_local_time() {
        let event = event_at("Dentist", 14, 30, 15);
        let reminder = Reminder::for_event(&event, &Utc);
        assert_eq!(reminder.title, "Event Reminder");
        assert_eq!(reminder.body, "Upcoming event: Dentist at 2:30 PM");
        assert_eq!(reminder.fire_at, Utc.with_ymd_and_hms(2024, 1, 1, 14, 15, 0).unwrap());

        let reminder = Reminder::for_event(&event, &chrono_tz::America::New_York);
        assert_eq!(reminder.body, "Upcoming event: Dentist at 9:30 AM");
    }

    struct MockNotifier {
        permission: Mutex<NotificationPermission>,
        grant_on_request: bool,
        fail_system: bool,
        requested: AtomicBool,
        system: Mutex<Vec<Reminder>>,
        in_app: Mutex<Vec<Reminder>>,
    }

    impl MockNotifier {
        fn new(permission: NotificationPermission) -> Self {
            Self {
                permission: Mutex::new(permission),
                grant_on_request: false,
                fail_system: false,
                requested: AtomicBool::new(false),
                system: Mutex::new(Vec::new()),
                in_app: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        fn permission(&self) -> NotificationPermission {
            *self.permission.lock().unwrap()
        }

        fn request_permission(&self) {
            self.requested.store(true, Ordering::SeqCst);
            if self.grant_on_request {
                *self.permission.lock().unwrap() = NotificationPermission::Granted;
            }
        }

        async fn notify_system(&self, reminder: &Reminder) -> Result<()> {
            if self.fail_system {
                return Err(Error::Aws("unavailable".to_string()));
            }
            self.system.lock().unwrap().push(reminder.clone());
            Ok(())
        }

        async fn notify_in_app(&self, reminder: &Reminder) -> Result<()> {
            self.in_app.lock().unwrap().push(reminder.clone());
            Ok(())
        }
    }

    fn sample_reminder() -> Reminder {
        Reminder::for_event(&event_at("Standup", 10, 15, 15), &Utc)
    }

    #[tokio::test]
    async fn test_dispatch_granted_uses_system() {
        let notifier = MockNotifier::new(NotificationPermission::Granted);
        let delivery = dispatch(&notifier, &sample_reminder()).await.unwrap();
        assert_eq!(delivery, Delivery::System);
        assert!(!notifier.requested.load(Ordering::SeqCst));
        assert_eq!(notifier.system.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_default_requests_and_falls_back() {
        let notifier = MockNotifier::new(NotificationPermission::Default);
        let delivery = dispatch(&notifier, &sample_reminder()).await.unwrap();
        assert_eq!(delivery, Delivery::InApp);
        assert!(notifier.requested.load(Ordering::SeqCst));
        assert_eq!(notifier.in_app.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_default_granted_immediately() {
        let mut notifier = MockNotifier::new(NotificationPermission::Default);
        notifier.grant_on_request = true;
        let delivery = dispatch(&notifier, &sample_reminder()).await.unwrap();
        assert_eq!(delivery, Delivery::System);
    }

    #[tokio::test]
    async fn test_dispatch_denied_and_failed_system_use_in_app() {
        let notifier = MockNotifier::new(NotificationPermission::Denied);
        assert_eq!(dispatch(&notifier, &sample_reminder()).await.unwrap(), Delivery::InApp);

        let mut notifier = MockNotifier::new(NotificationPermission::Granted);
        notifier.fail_system = true;
        assert_eq!(dispatch(&notifier, &sample_reminder()).await.unwrap(), Delivery::InApp);
        assert!(notifier.system.lock().unwrap().is_empty());
        assert_eq!(notifier.in_app.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tick_refires_without_dedup() {
        let notifier = MockNotifier::new(NotificationPermission::Granted);
        let events = vec![event_at("Standup", 10, 16, 15), event_at("Later", 12, 0, 15)];
        let mut scanner = ReminderScanner::new(Utc);

        let first = scanner.tick(&events, ten_o_clock(), &notifier).await;
        let second = scanner
            .tick(&events, ten_o_clock() + Duration::seconds(60), &notifier)
            .await;

        assert_eq!(first.events_scanned, 2);
        assert_eq!(first.reminders_due, 1);
        assert_eq!(first.system_deliveries, 1);
        assert_eq!(second.system_deliveries, 1);
        assert_eq!(notifier.system.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_tick_with_dedup_notifies_once() {
        let notifier = MockNotifier::new(NotificationPermission::Denied);
        let events = vec![event_at("Standup", 10, 16, 15)];
        let mut scanner = ReminderScanner::with_dedup(Utc);

        let first = scanner.tick(&events, ten_o_clock(), &notifier).await;
        let second = scanner
            .tick(&events, ten_o_clock() + Duration::seconds(60), &notifier)
            .await;

        assert_eq!(first.in_app_deliveries, 1);
        assert_eq!(second.suppressed, 1);
        assert_eq!(second.in_app_deliveries, 0);
        assert!(scanner.due(&events, ten_o_clock()).is_empty());
        assert_eq!(notifier.in_app.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dedup_forgets_past_fire_times() {
        let notifier = MockNotifier::new(NotificationPermission::Granted);
        let events = vec![event_at("Standup", 10, 16, 15), event_at("Review", 10, 20, 0)];
        let mut scanner = ReminderScanner::with_dedup(Utc);

        scanner.tick(&events, ten_o_clock(), &notifier).await;
        assert_eq!(scanner.remembered(), 1);

        scanner
            .tick(&events, ten_o_clock() + Duration::minutes(19), &notifier)
            .await;
        assert_eq!(scanner.remembered(), 1);
        assert_eq!(notifier.system.lock().unwrap().len(), 2);

        scanner
            .tick(&[], ten_o_clock() + Duration::minutes(30), &notifier)
            .await;
        assert_eq!(scanner.remembered(), 0);
    }
}
