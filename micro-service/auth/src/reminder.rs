use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use recall_database::service::DbService;
use recall_error::AppResult;
use recall_mailer::{MailTransport, templates};
use recall_middleware::{JwtService, TokenPurpose};
use recall_models::user::User;

const SECONDS_PER_DAY: u64 = 86_400;

/// What a reminder loop needs besides the user it belongs to
#[derive(Clone)]
pub struct ReminderContext {
    pub jwt_service: Arc<JwtService>,
    pub mailer: Arc<dyn MailTransport>,
    pub web_client_base_url: String,
}

/// Start the password-reminder loop for one user: sleep for the interval the
/// user chose at registration, send the reminder, repeat. Fire-and-forget —
/// there is no cancellation path; the loop dies with the process and is
/// rebuilt from the user table on the next start.
pub fn spawn_reminder(user: User, ctx: ReminderContext) {
    let interval = Duration::from_secs(u64::from(user.password_reminder.max(1)) * SECONDS_PER_DAY);

    tokio::spawn(async move {
        info!(
            "Password reminder scheduled every {} day(s) for {}",
            user.password_reminder, user.username
        );

        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = send_reminder(&user, &ctx).await {
                // Send failures never kill the loop; the next tick retries
                error!("Password reminder for {} failed: {}", user.username, e);
            }
        }
    });
}

/// Rebuild the reminder loops for every registered user
pub async fn spawn_all(users: &DbService<'static, User>, ctx: ReminderContext) -> AppResult<usize> {
    let all_users = users.get_all_records().await?;
    let count = all_users.len();

    for user in all_users {
        spawn_reminder(user, ctx.clone());
    }

    Ok(count)
}

async fn send_reminder(user: &User, ctx: &ReminderContext) -> AppResult<()> {
    let token = ctx
        .jwt_service
        .generate_token(&user.record_id(), TokenPurpose::Session)?;
    let url = templates::password_view_url(&ctx.web_client_base_url, &token);
    let html = templates::password_reminder_html(&user.username, &url);

    ctx.mailer.send(&user.email, "Password reminder", &html).await?;

    info!("Password reminder sent to {}", user.username);
    Ok(())
}
