use clap::Parser;
use enrollment_scraper::cli::{Cli, Command};
use enrollment_scraper::client::{Client, ClientBuilder, RetryingFetcher};
use enrollment_scraper::config::Config;
use enrollment_scraper::error::Result;
use enrollment_scraper::harvest::{
    write_discovery, Endpoints, HarvestOptions, Harvester, RunContext, RunMode,
};
use enrollment_scraper::logging::{init_logging, LoggerConfig};
use enrollment_scraper::model::Term;
use enrollment_scraper::{log_error, log_info, log_warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_logging(LoggerConfig::from_settings(
        &config.logging,
        cli.log_level.as_deref(),
    )?)?;

    if let Err(e) = run(cli.command, config).await {
        log_error!("[main] Run aborted: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, config: Config) -> Result<()> {
    if config.strict_course_level {
        log_warn!("[main] strict_course_level is deprecated; missing course levels will fail whole sources");
    }

    let client: Client = ClientBuilder::from_config(&config.client)?.build()?;
    let fetcher = RetryingFetcher::new(client, config.retry.policy());
    let harvester = Harvester::new(
        fetcher,
        Endpoints::new(&config.site)?,
        HarvestOptions::from_config(&config),
    );

    match command {
        Command::Scrape {
            year_term,
            cid_list,
        } => {
            let mode = RunMode::from_inputs(year_term, cid_list)?;
            log_info!("[main] Starting scrape: {:?}", mode);
            let summary = harvester
                .run(&RunContext::new(mode, config.output.clone()))
                .await?;
            log_info!(
                "[main] {} sources processed, {} skipped, {} failed; results in {}",
                summary.processed,
                summary.skipped,
                summary.failed.len(),
                summary.destination.display()
            );
        }
        Command::Discover { year_term, max_cid } => {
            let term = Term::new(year_term);
            let ids = harvester.discover(&term, max_cid).await?;
            let path = write_discovery(&ids, &term, &config.output.directory)?;
            log_info!("[main] Wrote {} course ids to {}", ids.len(), path.display());
        }
    }

    Ok(())
}
