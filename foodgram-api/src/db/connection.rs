use anyhow::Context;
use diesel::connection::InstrumentationEvent;
use diesel_async::{AsyncConnection, AsyncPgConnection};

use crate::api::configs;

pub(crate) fn instrument(conn: &mut AsyncPgConnection) {
    conn.set_instrumentation(|event: InstrumentationEvent<'_>| match event {
        InstrumentationEvent::StartQuery { query, .. } => {
            tracing::debug!("Executing query: {}", query);
        }
        InstrumentationEvent::FinishQuery { query, error, .. } => match error {
            Some(e) => tracing::error!("Query failed: {}\nError: {:?}", query, e),
            None => tracing::debug!("Executing query succeeded: {}", query),
        },
        _ => {}
    });
}

pub async fn establish_with(url: &str) -> anyhow::Result<AsyncPgConnection> {
    let mut conn = AsyncPgConnection::establish(url)
        .await
        .context("Error connecting database")?;

    if cfg!(debug_assertions) {
        instrument(&mut conn);
    }

    Ok(conn)
}

pub async fn establish() -> anyhow::Result<AsyncPgConnection> {
    let url = configs::get_database_url()?;
    establish_with(&url).await
}

pub async fn run_migrations(url: &str) -> anyhow::Result<()> {
    use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");
    let conn = establish_with(url).await?;

    let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
        AsyncConnectionWrapper::from(conn);

    tokio::task::spawn_blocking(move || {
        async_wrapper
            .run_pending_migrations(MIGRATIONS)
            .map(|applied| {
                for version in applied {
                    tracing::info!(%version, "migration applied");
                }
            })
            .map_err(|e| anyhow::anyhow!("Error running migrations: {}", e))
    })
    .await?
}
