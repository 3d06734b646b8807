use crate::app::App;
use crate::commands::Out;
use crate::reminder::{ConsoleNotifier, ReminderScheduler};
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

const REMINDERS_OFF: &str =
    "Reminders are off, set \"notifications\": true in config.json to turn them on";

/// Runs the reminder scheduler in the foreground until Ctrl-C.
///
/// Reminders are printed to the terminal at each configured time of day. With `notifications`
/// turned off in the config the scheduler reports that reminders are disabled and this returns
/// right away.
pub async fn remind(app: &App) -> Result<Out<()>> {
    remind_until(app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Runs the scheduler until `stop` completes or the scheduler gives up on its own.
pub(crate) async fn remind_until(app: &App, stop: impl Future<Output = ()>) -> Result<Out<()>> {
    let notifier = Arc::new(ConsoleNotifier::new(app.config().notifications_enabled()));
    let mut handle = ReminderScheduler::new(
        app.config().reminder_slots().to_vec(),
        notifier.clone(),
        app.clock(),
    )
    .with_sink(notifier)
    .spawn();

    tokio::select! {
        _ = stop => {
            info!("Stopping reminders");
            handle.cancel();
            Ok("Reminders stopped".into())
        }
        _ = handle.join() => {
            Ok(REMINDERS_OFF.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_remind_runs_until_stopped() {
        let env = TestEnv::new().await;
        let app = env.app().await;
        let out = remind_until(&app, tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)))
            .await
            .unwrap();
        assert_eq!(out.message(), "Reminders stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_remind_returns_when_disabled() {
        let env = TestEnv::new().await;
        let mut text = crate::utils::read(env.config().config_path()).await.unwrap();
        text = text.replace("\"notifications\": true", "\"notifications\": false");
        crate::utils::write(env.config().config_path(), text).await.unwrap();
        let config = crate::Config::load(env.config().root()).await.unwrap();
        let app = App::load(config).await;

        let out = remind_until(&app, std::future::pending()).await.unwrap();
        assert!(out.message().starts_with("Reminders are off"));
    }
}
