//! One-shot dashboard commands. None of them touch the rendered board:
//! the next poll is the source of truth.

use crate::{
    api::ApiError,
    models::CommandReply,
    notify::NotificationSeverity,
};

use super::DashboardPoller;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Asks the user before a destructive command is sent.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Server accepted; carries its message.
    Completed(String),
    Failed,
    /// The confirmation prompt was declined; nothing was sent.
    Declined,
}

impl CommandOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CommandOutcome::Completed(_))
    }
}

pub const CLEAR_ALL_PROMPT: &str =
    "This deletes all entry logs and alerts and stops monitoring. Continue?";
pub const RESET_PROMPT: &str =
    "This resets the system to a clean state (students are kept). Continue?";

impl DashboardPoller {
    pub async fn resolve_alert(&self, alert_id: i64) -> CommandOutcome {
        let result = self.api.resolve_alert(alert_id).await;
        self.report(result, "Failed to resolve alert")
    }

    pub async fn stop_alarm(&self) -> CommandOutcome {
        let result = self.api.stop_alarm().await;
        self.report(result, "Failed to stop alarm")
    }

    pub async fn clear_all_data(&self, confirm: &dyn Confirm) -> CommandOutcome {
        if !confirm.confirm(CLEAR_ALL_PROMPT) {
            log_info!("clear_all_data declined");
            return CommandOutcome::Declined;
        }
        let result = self.api.clear_all_data().await;
        self.report(result, "Failed to clear data")
    }

    /// Delete alerts that were already resolved.
    pub async fn clear_resolved_alerts(&self) -> CommandOutcome {
        let result = self.api.clear_alerts().await;
        self.report(result, "Failed to clear alerts")
    }

    pub async fn system_reset(&self, confirm: &dyn Confirm) -> CommandOutcome {
        if !confirm.confirm(RESET_PROMPT) {
            log_info!("system_reset declined");
            return CommandOutcome::Declined;
        }
        let result = self.api.system_reset().await;
        self.report(result, "Failed to reset system")
    }

    fn report(
        &self,
        result: Result<CommandReply, ApiError>,
        failure: &str,
    ) -> CommandOutcome {
        match result {
            Ok(reply) if reply.status.is_success() => {
                let message = reply.message_or("Done").to_string();
                self.notifier.notify(&message, NotificationSeverity::Success);
                CommandOutcome::Completed(message)
            }
            Ok(reply) => {
                log_warn!("{failure}: {}", reply.message_or("no message"));
                self.notifier.notify(failure, NotificationSeverity::Error);
                CommandOutcome::Failed
            }
            Err(err) => {
                log_warn!("{failure}: {err}");
                self.notifier.notify(failure, NotificationSeverity::Error);
                CommandOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        models::ReplyStatus,
        test_support::{FakeApi, RecordingSink},
    };

    fn poller() -> (DashboardPoller, Arc<FakeApi>, Arc<RecordingSink>) {
        let api = Arc::new(FakeApi::new());
        let sink = Arc::new(RecordingSink::default());
        let poller = DashboardPoller::new(api.clone(), sink.clone(), Duration::from_secs(3));
        (poller, api, sink)
    }

    #[tokio::test]
    async fn resolve_reports_server_message_verbatim() {
        let (poller, api, sink) = poller();
        api.set_command_reply(Ok(CommandReply {
            status: ReplyStatus::Success,
            message: Some("Alert resolved and alarm stopped".into()),
        }));

        let outcome = poller.resolve_alert(42).await;
        assert_eq!(
            outcome,
            CommandOutcome::Completed("Alert resolved and alarm stopped".into())
        );
        assert_eq!(api.calls(), vec!["resolve_alert/42".to_string()]);
        assert_eq!(
            sink.last(),
            Some((
                "Alert resolved and alarm stopped".to_string(),
                NotificationSeverity::Success
            ))
        );
        // No optimistic update: the board is untouched until the next poll.
        assert!(poller.board().is_none());
    }

    #[tokio::test]
    async fn failed_resolve_uses_generic_message() {
        let (poller, api, sink) = poller();
        api.set_command_reply(Ok(CommandReply {
            status: ReplyStatus::Error,
            message: Some("Error resolving alert: 404".into()),
        }));

        assert_eq!(poller.resolve_alert(7).await, CommandOutcome::Failed);
        assert_eq!(
            sink.last(),
            Some(("Failed to resolve alert".to_string(), NotificationSeverity::Error))
        );
    }

    #[tokio::test]
    async fn stop_alarm_network_failure_is_reported() {
        let (poller, api, sink) = poller();
        api.set_command_reply(Err(ApiError::Request("connection reset".into())));

        assert_eq!(poller.stop_alarm().await, CommandOutcome::Failed);
        assert_eq!(
            sink.last(),
            Some(("Failed to stop alarm".to_string(), NotificationSeverity::Error))
        );
    }

    #[tokio::test]
    async fn declined_clear_sends_nothing() {
        let (poller, api, sink) = poller();

        let outcome = poller.clear_all_data(&|_: &str| false).await;
        assert_eq!(outcome, CommandOutcome::Declined);
        assert_eq!(api.calls_to("clear_all_data"), 0);
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn confirmed_clear_is_sent() {
        let (poller, api, _) = poller();

        let outcome = poller
            .clear_all_data(&|prompt: &str| prompt.contains("Continue?"))
            .await;
        assert!(outcome.is_completed());
        assert_eq!(api.calls_to("clear_all_data"), 1);
    }

    #[tokio::test]
    async fn reset_and_clear_alerts_hit_their_endpoints() {
        let (poller, api, _) = poller();

        assert!(poller.clear_resolved_alerts().await.is_completed());
        assert_eq!(poller.system_reset(&|_: &str| false).await, CommandOutcome::Declined);
        assert!(poller.system_reset(&|_: &str| true).await.is_completed());
        assert_eq!(api.calls(), vec!["clear_alerts".to_string(), "system_reset".to_string()]);
    }
}
