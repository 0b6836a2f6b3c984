use squid_roster::{config::Config, error::AppErr, routes, state::Services};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppErr> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg      = Config::from_env()?;
    let services = Services::from_config(&cfg).await?;

    // warm the avatar tiers without holding up the listener
    {
        let avatars = services.avatars.clone();
        let roster  = services.roster.clone();
        tokio::spawn(async move { avatars.prefetch(&roster).await; });
    }

    let app = routes::app(services, &cfg.static_dir);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
