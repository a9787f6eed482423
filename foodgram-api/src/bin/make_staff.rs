use anyhow::Context;

use foodgram_api::db::{connection, user};

/// Grants staff rights, which tag and ingredient creation require.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    foodgram_api::utils::logging::setup_console_log();

    let email = std::env::args()
        .nth(1)
        .context("usage: make_staff <email>")?;
    let mut conn = connection::establish().await?;
    let m = user::User::get_by_email(&mut conn, &email)
        .await?
        .with_context(|| format!("no user registered with {}", email))?;
    user::set_staff(&mut conn, m.id, true).await?;

    tracing::info!(id = m.id, %email, "user promoted to staff");
    Ok(())
}
