use anyhow::Result;
use call_concierge::{roster, AppState, CommandParser, Config, RestClient, SessionRegistry};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "call-concierge",
    about = "Voice meeting assistant that pulls people into calls over SMS"
)]
struct Cli {
    /// Config file basename (the extension is resolved by the config loader)
    #[arg(long, default_value = "config/call-concierge")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "call_concierge=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    info!("{} starting", cfg.service.name);

    let roster = Arc::new(roster::load(&cfg.roster.path));
    let parser = Arc::new(CommandParser::new(&cfg.assistant.wake_word));
    let registry = Arc::new(SessionRegistry::new());
    let control = Arc::new(RestClient::new(&cfg.telephony));

    let state = AppState {
        assistant: cfg.assistant.clone(),
        transcription: cfg.transcription.clone(),
        registry,
        control,
        parser,
        roster,
    };
    let app = call_concierge::create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
