//! # abc_extract
//!
//! A minimal host for the ABC extractors: fetches each URL given on the
//! command line, extracts its media information and prints the info JSON
//! (or writes `<id>.info.json` files).
//!
//! ## Usage
//!
//! ```sh
//! abc_extract -o ./info http://iview.abc.net.au/programs/call-the-midwife/ZW0898A003S00
//! ```
//!
//! Expired content is reported and skipped; any other failure makes the
//! process exit with a non-zero status once every URL has been tried.

use abc_extract::cli::Cli;
use abc_extract::outputs::json;
use abc_extract::{ExtractError, Extraction, HttpFetcher, Site, extract};
use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.output_dir, concurrency = args.concurrency, "Parsed CLI arguments");

    let fetcher = HttpFetcher::new(&args.fetch_config())?;
    let total = args.urls.len();
    info!(total, "Starting extraction");

    // Extract concurrently; each call is independent
    let results: Vec<(String, Result<Extraction, ExtractError>)> = stream::iter(args.urls.iter())
        .map(|url| {
            let fetcher = &fetcher;
            async move { (url.clone(), extract(fetcher, url).await) }
        })
        .buffer_unordered(usize::from(args.concurrency))
        .collect()
        .await;

    let mut failed = 0usize;
    let mut skipped = 0usize;
    for (url, result) in results {
        match result {
            Ok(extraction) => {
                if let Err(e) = emit(&extraction, &url, &args).await {
                    error!(%url, error = %e, "Failed to write output");
                    failed += 1;
                }
            }
            Err(e) if e.is_expected() => {
                warn!(%url, error = %e, "Skipping");
                skipped += 1;
            }
            Err(e) => {
                report_failure(&url, &e);
                failed += 1;
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        total,
        failed,
        skipped,
        millis = elapsed.as_millis() as u64,
        "Execution complete"
    );

    if failed > 0 {
        return Err(format!("{failed} of {total} URLs failed").into());
    }
    Ok(())
}

async fn emit(extraction: &Extraction, url: &str, args: &Cli) -> Result<(), Box<dyn Error>> {
    match &args.output_dir {
        Some(dir) => {
            json::write_info_json(extraction, dir, url, args.pretty).await?;
        }
        None => println!("{}", json::to_json(extraction, args.pretty)?),
    }
    Ok(())
}

fn report_failure(url: &str, e: &ExtractError) {
    error!(%url, error = %e, "Extraction failed");
    if let ExtractError::UpstreamAuthFailure(_) = e {
        if let Some(site) = Site::for_url(url) {
            let countries = site.geo_countries();
            if !countries.is_empty() {
                warn!(
                    %url,
                    countries = %countries.join(","),
                    "This site only serves media to some countries; the request may be geo-blocked"
                );
            }
        }
    }
}
