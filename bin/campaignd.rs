//! Campaign daemon entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use voicebot_core::call::CallDeps;
use voicebot_core::campaign::CampaignRunner;
use voicebot_core::config::VoicebotConfig;
use voicebot_core::nlu::amd::AmdKeywords;
use voicebot_core::objection::ObjectionLibrary;
use voicebot_core::persistence::sqlite::SqlitePersistence;
use voicebot_core::scenario::load::load as load_scenario;
use voicebot_core::softswitch::SoftswitchClient;
use voicebot_core::speech::batch::HttpBatchTranscriber;
use voicebot_core::speech::stream::WsStreamingTranscriber;

#[derive(Parser, Debug)]
#[command(name = "campaignd", about = "Outbound voice-bot campaign daemon")]
struct Args {
    #[arg(long, default_value = "campaignd.toml")]
    config: String,

    #[arg(long)]
    campaign: String,

    #[arg(long)]
    scenario: String,

    #[arg(long)]
    objection_library: PathBuf,

    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[arg(long, default_value_t = 10)]
    poll_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = VoicebotConfig::load(&args.config)?;
    info!(campaign = %args.campaign, dry_run = args.dry_run, "starting campaignd");

    let scenario = Arc::new(load_scenario(&args.scenario, std::path::Path::new("."))?);
    let objection_library = Arc::new(ObjectionLibrary::load(&args.objection_library, &config.campaign.default_theme)?);

    if args.dry_run {
        info!("dry run: scenario and objection library validated, exiting without connecting");
        return Ok(());
    }

    let softswitch: Arc<dyn voicebot_core::softswitch::SoftswitchApi> =
        Arc::new(SoftswitchClient::connect(config.softswitch.clone()).await?);
    let persistence = Arc::new(SqlitePersistence::connect(&config.database.url).await?);
    let streaming = Arc::new(WsStreamingTranscriber::new(&config.speech.stream_endpoint));
    let batch = Arc::new(HttpBatchTranscriber::new(&config.speech.batch_endpoint));
    let actions = Arc::new(voicebot_core::actions::DefaultActionExecutor::new(Arc::clone(&softswitch)));

    let deps = CallDeps {
        softswitch,
        streaming,
        batch,
        persistence,
        objection_library,
        actions,
        scenario,
        speech_config: config.speech.clone(),
        amd_keywords: AmdKeywords::default(),
        general: config.general.clone(),
    };

    let runner = CampaignRunner::new(config.clone(), deps);
    let cancel = CancellationToken::new();

    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_cancel.cancel();
    });

    let mut interval = tokio::time::interval(Duration::from_secs(args.poll_interval_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                match runner.run_once(&args.campaign, cancel.clone()).await {
                    Ok(dispatched) if dispatched > 0 => info!(dispatched, "poll cycle dispatched calls"),
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "poll cycle failed"),
                }
            }
        }
    }

    info!("campaignd shutting down");
    Ok(())
}
