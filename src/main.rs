use dark_sprinter::app;
use dark_sprinter::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> iced::Result {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dark_sprinter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        tracks_api = %config.tracks_api_url,
        stats_api = %config.stats_api_url,
        playlist_limit = config.playlist_limit,
        "Starting player",
    );

    app::run(config)
}
