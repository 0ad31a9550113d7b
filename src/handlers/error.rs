use crate::commands::Data;
use crate::utils::embed;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Handle framework errors
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(command = %ctx.command().name, error = %error, "Command failed");
            let reply = embed::error("Command Failed", &error.to_string());
            let _ = ctx
                .send(poise::CreateReply::default().embed(reply).ephemeral(true))
                .await;
        }
        poise::FrameworkError::CommandPanic { payload, ctx, .. } => {
            tracing::error!(command = %ctx.command().name, payload = ?payload, "Command panicked");
            let reply = embed::error(
                "Internal Error",
                "An unexpected error occurred. Please try again later.",
            );
            let _ = ctx
                .send(poise::CreateReply::default().embed(reply).ephemeral(true))
                .await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            tracing::error!(event = event.snake_case_name(), error = %error, "Event handler failed");
        }
        error => {
            tracing::error!(error = %error, "Framework error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Display;

    fn loggable<T: Display>() {}

    #[test]
    fn test_framework_error_is_loggable_without_debug_data() {
        loggable::<poise::FrameworkError<'static, Data, Error>>();
    }
}
