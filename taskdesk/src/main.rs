// TaskDesk - headless client for the TaskDesk task tracker
// Restores or opens a session and prints the first page of tasks

use anyhow::{bail, Context};
use taskdesk::app;
use taskdesk::pagination::{self, PageItem};
use taskdesk::services::FetchOutcome;
use taskdesk::session::AuthStatus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EMAIL_ENV: &str = "TASKDESK_EMAIL";
const PASSWORD_ENV: &str = "TASKDESK_PASSWORD";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdesk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TaskDesk client");

    let state = app::setup().context("failed to initialize client")?;

    if state.auth.restore().await != AuthStatus::Authenticated {
        let (Ok(email), Ok(password)) = (std::env::var(EMAIL_ENV), std::env::var(PASSWORD_ENV)) else {
            bail!("no stored session; set {} and {} to sign in", EMAIL_ENV, PASSWORD_ENV);
        };
        state
            .auth
            .login(&email, &password)
            .await
            .context("sign-in failed")?;
    }

    if let Some(user) = state.session.current_user() {
        println!("Signed in as {} <{}>", user.name, user.email);
    }

    let page = match state.tasks_query.refresh().await? {
        FetchOutcome::Applied(page) => page,
        FetchOutcome::Stale => bail!("task list request was superseded"),
    };

    for task in &page.data {
        println!(
            "[{:<11}] {:<6} {}",
            task.status.as_str(),
            task.priority.as_str(),
            task.title
        );
    }

    let pager: Vec<String> = pagination::window_default(page.meta.page, page.meta.total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) if n == page.meta.page => format!("[{}]", n),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect();
    println!("{} task(s)  pages: {}", page.meta.total, pager.join(" "));

    Ok(())
}
