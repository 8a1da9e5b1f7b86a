use anyhow::Context;
use hilaw_client::{
    configuration::read_config,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = read_config().context("Failed to read configuration.")?;

    let subscriber = get_subscriber(
        config.application.name.clone(),
        config.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let application = Application::build(config).context("Failed to build the client.")?;
    application.initialize().await;

    let manga = application.manga();
    let (hot, trending) = tokio::join!(
        manga.fetch_hot_manga(None, false),
        manga.fetch_trending(false)
    );

    match hot {
        Ok(items) => tracing::info!(count = items.len(), "Hot manga ready"),
        Err(error) => tracing::warn!(err.msg = %error, "Hot manga unavailable"),
    }
    match trending {
        Ok(items) => tracing::info!(count = items.len(), "Trending manga ready"),
        Err(error) => tracing::warn!(err.msg = %error, "Trending manga unavailable"),
    }

    let report = manga.stats();
    tracing::info!(
        api_calls = report.api_calls,
        cache_hits = report.cache_hits.total(),
        hit_rate = %report.hit_rate,
        total_refreshes = report.total_refreshes,
        "Manga cache report"
    );

    let session = application.session().snapshot();
    tracing::info!(
        authenticated = session.is_authenticated,
        user = ?session.user.as_ref().map(|user| user.display_name()),
        "Session state"
    );

    Ok(())
}
