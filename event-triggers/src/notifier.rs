//! Reminder delivery over SNS.
//!
//! The topic stands in for the system notification channel: with a topic
//! configured permission is granted, without one every reminder goes to the
//! in-app path, which for a background job means the structured log.

use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;
use serde::Serialize;
use shared::reminder::Reminder;
use shared::{NotificationPermission, Notifier, Result};
use tracing::{debug, info};

/// SNS message published for one reminder.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReminderMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    reminder: &'a Reminder,
}

/// Serialize the SNS payload for `reminder`.
pub fn reminder_message(reminder: &Reminder) -> Result<String> {
    Ok(serde_json::to_string(&ReminderMessage {
        kind: "reminder",
        reminder,
    })?)
}

pub struct SnsNotifier {
    client: SnsClient,
    topic_arn: Option<String>,
}

impl SnsNotifier {
    pub fn new(client: SnsClient, topic_arn: Option<String>) -> Self {
        Self { client, topic_arn }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    fn permission(&self) -> NotificationPermission {
        match self.topic_arn {
            Some(_) => NotificationPermission::Granted,
            None => NotificationPermission::Denied,
        }
    }

    fn request_permission(&self) {
        debug!("Notification permission comes from configuration, nothing to request");
    }

    async fn notify_system(&self, reminder: &Reminder) -> Result<()> {
        let Some(topic_arn) = &self.topic_arn else {
            return Err(shared::Error::Config(
                "NOTIFICATION_TOPIC_ARN not set".to_string(),
            ));
        };

        self.client
            .publish()
            .topic_arn(topic_arn)
            .subject(&reminder.title)
            .message(reminder_message(reminder)?)
            .send()
            .await
            .map_err(|e| shared::Error::Aws(format!("Failed to publish to SNS: {}", e)))?;

        info!(event_id = %reminder.event_id, owner = %reminder.owner, "Reminder published");
        Ok(())
    }

    async fn notify_in_app(&self, reminder: &Reminder) -> Result<()> {
        info!(
            event_id = %reminder.event_id,
            owner = %reminder.owner,
            title = %reminder.title,
            body = %reminder.body,
            "Reminder"
        );
        Ok(())
    }
}
