use anyhow::{Context, Result};
use serde::Serialize;
use sportsbook_scraper::browser::ChromeBrowser;
use sportsbook_scraper::config::Config;
use sportsbook_scraper::diagnostic::{format_table, print_sports, OutputMode, SportSummary};
use sportsbook_scraper::feed::pinnacle::PinnacleScraper;
use sportsbook_scraper::feed::underdog::UnderdogScraper;
use sportsbook_scraper::feed::SportsbookScraper;
use std::path::Path;
use tabled::Tabled;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.toml";

fn report<S>(scraper: &S, summaries: &[SportSummary], mode: OutputMode) -> Result<()>
where
    S: SportsbookScraper,
    S::Record: Tabled + Serialize,
{
    print_sports(scraper.platform(), scraper.odds_table(), mode)?;
    println!();
    for summary in summaries {
        println!("  {}", summary);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("sportsbook-scraper.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sportsbook_scraper=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let mode = OutputMode::from_json_flag(std::env::args().any(|arg| arg == "--json"));
    let config_path = std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let config = Config::load(Path::new(&config_path))?;

    // Load saved credentials from .env (real env vars take precedence)
    Config::load_env_file();

    let wait = config.browser.wait_policy();

    if config.pinnacle.enabled && !config.pinnacle.sports.is_empty() {
        let browser = ChromeBrowser::launch(&config.browser)
            .context("failed to launch Chrome for Pinnacle")?;
        let mut pinnacle = PinnacleScraper::new(browser, &config.pinnacle, wait);
        let summaries = pinnacle.scrape_odds(&config.pinnacle.sports).await;
        report(&pinnacle, &summaries, mode)?;
    }

    if config.underdog.enabled {
        let browser = ChromeBrowser::launch(&config.browser)
            .context("failed to launch Chrome for Underdog Fantasy")?;
        let mut underdog = UnderdogScraper::open(browser, &config.underdog, wait)
            .await
            .context("failed to open Underdog Fantasy")?;

        if config.underdog.login {
            let credentials = Config::underdog_credentials()?;
            underdog
                .login(&credentials)
                .await
                .context("Underdog Fantasy sign-in failed")?;
        }

        if !config.underdog.sports.is_empty() {
            let summaries = underdog.scrape_odds(&config.underdog.sports).await;
            report(&underdog, &summaries, mode)?;
        }

        if config.underdog.fetch_current_bets {
            match underdog.fetch_current_bets().await {
                Ok(bets) => {
                    println!();
                    println!("  Open bets ({})", bets.len());
                    println!("{}", format_table(bets, mode)?);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not fetch open bets");
                    println!("  Could not fetch open bets: {:#}", anyhow::Error::from(e));
                }
            }
        }
    }

    Ok(())
}
