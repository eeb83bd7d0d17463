use clap::Parser;
use deal_sweep::errors::SetupError;
use deal_sweep::fetchers::web::WebFetcher;
use deal_sweep::sinks::{self, JsonFileSink, LogNotifier, Notifier};
use deal_sweep::{AppConfig, ExtractionPipeline, RunResult};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match run(&args).await {
        // Zero deals is a normal outcome
        Ok(result) => {
            ::log::info!("Sweep complete - {} deals", result.total_deals);
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Setup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<RunResult, SetupError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let fetcher = WebFetcher::connect(&config.fetch)
        .await
        .map_err(|e| SetupError::WebDriverUnavailable(e.to_string()))?;
    ::log::info!("Using WebDriver at {}", fetcher.webdriver_url());

    let pipeline = ExtractionPipeline::new(&config, fetcher)?;

    let start_time = std::time::Instant::now();
    let outcomes = pipeline.run_all(&config.sources).await;
    pipeline.into_fetcher().close().await;

    let result = RunResult::from_outcomes(&outcomes);
    ::log::info!(
        "Found {} deals across {} sources in {:.2} seconds",
        result.total_deals,
        outcomes.len(),
        start_time.elapsed().as_secs_f64()
    );
    for (i, deal) in result.deals.iter().enumerate() {
        ::log::info!(
            "{}. {}: {} - {} ({})",
            i + 1,
            deal.source,
            deal.price,
            deal.discount_label,
            deal.title
        );
    }

    let sink = JsonFileSink::new(&config.output_path);
    let log_notifier = LogNotifier;
    let notifier: Option<&dyn Notifier> = if config.notification.enabled {
        Some(&log_notifier)
    } else {
        None
    };
    sinks::publish(&result, &sink, notifier, &config.notification.subject);

    Ok(result)
}
