//! # Bay Tides Entry Point
//!
//! Loads the configuration, fetches the ocean-model extract and writes one
//! forecast report per configured site. `--stdout` prints ASCII charts
//! instead of writing files, `--demo` runs on a synthetic harmonic tide
//! without touching the network.


use anyhow::Context;
use bay_tides_lib::{
    config::{Config, CONFIG_FILE},
    dataset::{self, ModelExtract, Source},
    forecast,
    renderer::draw_ascii,
    report::{self, SiteReport},
    synthetic::TideModel,
    TideParams,
};
use chrono::{DateTime, Duration, DurationRound, Utc};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

/// Coastal tide forecasts from hourly ocean-model output.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Print an ASCII chart per site instead of writing reports
    #[arg(long)]
    stdout: bool,

    /// Use a synthetic harmonic tide instead of the model extract
    #[arg(long)]
    demo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = Config::load_from_path(&cli.config);
    let params = config.params.to_params();
    let now = Utc::now();

    if cli.demo {
        return run_demo(now, &params);
    }

    info!("Starting forecast run");

    // Create Tokio runtime for the dataset download
    let rt = tokio::runtime::Runtime::new()?;
    let source = Source {
        location: &config.dataset.source,
        cache_path: &config.dataset.cache_path,
        ttl_secs: config.dataset.cache_ttl_minutes * 60,
    };
    let mut extract = rt
        .block_on(dataset::fetch(&source))
        .with_context(|| format!("loading model extract from {}", config.dataset.source))?;
    extract.shift_levels(config.dataset.level_offset);

    let written = run_sites(&extract, &config, now, cli.stdout)?;
    info!("Finished: {} site(s) processed", written);
    Ok(())
}

/// Forecast every configured site; a failing site is logged and skipped.
///
/// Returns the number of sites processed. Fails only if every site failed.
fn run_sites(
    extract: &ModelExtract,
    config: &Config,
    now: DateTime<Utc>,
    stdout: bool,
) -> anyhow::Result<usize> {
    let params = config.params.to_params();
    let tz = report::display_timezone(&config.output.timezone)?;
    let mut done = 0;

    for site in &config.sites {
        info!("Forecasting {}", site.name);
        let result = forecast::site_forecast(extract, site, now, &params).and_then(|f| {
            if stdout {
                draw_ascii(&f.tide);
                Ok(())
            } else {
                let report = SiteReport::from_forecast(&f, now, &tz);
                report::write_report(&config.output.directory, &site.name, &report).map(|_| ())
            }
        });

        match result {
            Ok(()) => done += 1,
            Err(e) => error!("Site {} failed: {}", site.name, e),
        }
    }

    if done == 0 && !config.sites.is_empty() {
        anyhow::bail!("no site could be forecast");
    }
    Ok(done)
}

/// Chart a synthetic tide centred on `now`.
fn run_demo(now: DateTime<Utc>, params: &TideParams) -> anyhow::Result<()> {
    info!("Demo mode: synthetic M2 + S2 tide");
    let start = now.duration_trunc(Duration::hours(1))? - Duration::hours(12);
    let hourly = TideModel::default().hourly_series(start, 48);
    let outlook = forecast::tidal_outlook(&hourly, now, params)?;
    draw_ascii(&outlook);
    Ok(())
}
