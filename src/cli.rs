//! Command-line interface definitions for abc_extract.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also be provided through environment variables.

use crate::fetch::{DEFAULT_USER_AGENT, FetchConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for abc_extract.
///
/// # Examples
///
/// ```sh
/// # Print info JSON for an article
/// abc_extract http://www.abc.net.au/news/2015-10-23/nab-lifts-interest-rates-following-westpac-and-cba/6880080
///
/// # Write one <id>.info.json per URL, four at a time
/// abc_extract -o ./info -c 4 URL1 URL2 URL3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Article or program URLs to extract
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Write `<id>.info.json` files to this directory instead of stdout
    #[arg(short, long, env = "ABC_EXTRACT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of URLs extracted at once
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Per-request timeout in seconds
    #[arg(long, env = "ABC_EXTRACT_TIMEOUT", default_value_t = 30)]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[arg(long, env = "ABC_EXTRACT_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "abc_extract",
            "--output-dir",
            "./info",
            "http://www.abc.net.au/news/2015-10-19/6866214",
        ]);

        assert_eq!(cli.urls, vec!["http://www.abc.net.au/news/2015-10-19/6866214"]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("./info")));
        assert_eq!(cli.concurrency, 4);
        assert!(!cli.pretty);
    }

    #[test]
    fn test_cli_short_flags_and_fetch_config() {
        let cli = Cli::parse_from([
            "abc_extract",
            "-c",
            "2",
            "--timeout-secs",
            "5",
            "--user-agent",
            "test-agent",
            "--pretty",
            "http://iview.abc.net.au/programs/call-the-midwife/ZW0898A003S00",
            "http://www.abc.net.au/news/2015-10-19/6866214",
        ]);

        assert_eq!(cli.urls.len(), 2);
        assert_eq!(cli.concurrency, 2);
        assert!(cli.pretty);

        let config = cli.fetch_config();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_cli_requires_urls() {
        assert!(Cli::try_parse_from(["abc_extract"]).is_err());
        assert!(Cli::try_parse_from(["abc_extract", "-c", "0", "http://x"]).is_err());
    }
}
