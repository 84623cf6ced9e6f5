use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::Password;
use std::sync::Arc;
use tempchart_core::{
    ChartPage, Config, HistoryView, Pipeline, ProviderId, RangeSpec, SeriesCache, SystemClock,
};

use tracing::debug;

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tempchart", version, about = "Daily average temperature charts")]
pub struct Cli {
    /// Log pipeline steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key for a provider.
    Configure {
        /// Provider short name: "geoapify" or "meteostat".
        provider: String,
    },

    /// Chart recent temperatures for a city.
    Show {
        /// City name; falls back to the configured default, then to your position.
        city: Option<String>,

        /// Ignore any city and use the current position.
        #[arg(long, conflicts_with = "city")]
        here: bool,

        /// Number of past days to chart (7, 14 or 30).
        #[arg(long, value_parser = parse_day_count, conflicts_with_all = ["start", "end"])]
        days: Option<u32>,

        /// First day of an explicit range (YYYY-MM-DD).
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        /// Last day of an explicit range (YYYY-MM-DD).
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,

        /// Also print the day-by-day list.
        #[arg(long)]
        history: bool,
    },

    /// Interactive chart session.
    Browse {
        city: Option<String>,

        #[arg(long, value_parser = parse_day_count)]
        days: Option<u32>,
    },

    /// Inspect or clear the series cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Print where the cache lives.
    Path,
    /// Delete every cached series.
    Clear,
}

fn parse_day_count(s: &str) -> Result<u32, String> {
    let days: u32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if RangeSpec::DAY_COUNT_CHOICES.contains(&days) {
        Ok(days)
    } else {
        Err(format!("day count must be one of {:?}", RangeSpec::DAY_COUNT_CHOICES))
    }
}

/// City to use: explicit argument, then the configured default, else blank (current position).
fn pick_city(arg: Option<String>, here: bool, config: &Config) -> String {
    if here {
        return String::new();
    }
    arg.or_else(|| config.default_city.clone()).unwrap_or_default()
}

fn pick_range(
    days: Option<u32>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    config: &Config,
) -> RangeSpec {
    match (days, start, end) {
        (_, Some(start), Some(end)) => RangeSpec::Explicit { start, end },
        (Some(days), _, _) => RangeSpec::LastDays(days),
        _ => config.default_range(),
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { city, here, days, start, end, history } => {
                let config = Config::load()?;
                let city = pick_city(city, here, &config);
                let range = pick_range(days, start, end, &config);
                debug!(%city, %range, "chart requested");

                let mut page = ChartPage::new(Pipeline::from_config(&config)?, city, range);
                page.mount().await;

                if let Some(err) = &page.state().error {
                    anyhow::bail!("{err}");
                }
                println!("{}", render::chart_view(page.state()));

                if history {
                    let view = HistoryView::from_navigation(page.view_history().as_ref());
                    println!("{}", render::history_view(&view));
                }
                Ok(())
            }
            Command::Browse { city, days } => {
                let config = Config::load()?;
                let city = pick_city(city, false, &config);
                let range = days.map(RangeSpec::LastDays).unwrap_or_else(|| config.default_range());
                debug!(%city, %range, "starting interactive session");

                let page = ChartPage::new(Pipeline::from_config(&config)?, city, range);
                session::run(page).await
            }
            Command::Cache { action } => {
                let path = Config::cache_file_path()?;
                match action {
                    CacheAction::Path => println!("{}", path.display()),
                    CacheAction::Clear => {
                        let config = Config::load()?;
                        SeriesCache::from_config(&config, Arc::new(SystemClock))?.clear()?;
                        println!("Cleared {}", path.display());
                    }
                }
                Ok(())
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if config.is_provider_configured(id) {
        println!("Provider '{id}' already has an API key; entering a new one replaces it.");
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_help_message(help_for(id))
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);
    let path = config.save()?;
    println!("Saved {id} credentials to {}", path.display());

    Ok(())
}

fn help_for(id: ProviderId) -> &'static str {
    match id {
        ProviderId::Geoapify => "Create a key at https://myprojects.geoapify.com",
        ProviderId::Meteostat => "Subscribe to Meteostat on https://rapidapi.com",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_accepts_only_choices() {
        assert_eq!(parse_day_count("14"), Ok(14));
        assert!(parse_day_count("10").is_err());
        assert!(parse_day_count("seven").is_err());
    }

    #[test]
    fn explicit_bounds_win_over_default() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        assert_eq!(
            pick_range(None, Some(start), Some(end), &Config::default()),
            RangeSpec::Explicit { start, end }
        );
        assert_eq!(pick_range(Some(30), None, None, &Config::default()), RangeSpec::LastDays(30));
        assert_eq!(pick_range(None, None, None, &Config::default()), RangeSpec::LastDays(7));
    }

    #[test]
    fn city_falls_back_to_config_then_position() {
        let config = Config { default_city: Some("Lagos".into()), ..Config::default() };

        assert_eq!(pick_city(Some("Oslo".into()), false, &config), "Oslo");
        assert_eq!(pick_city(None, false, &config), "Lagos");
        assert_eq!(pick_city(None, true, &config), "");
        assert_eq!(pick_city(None, false, &Config::default()), "");
    }

    #[test]
    fn show_parses_explicit_range() {
        let cli = Cli::try_parse_from([
            "tempchart", "show", "Lagos", "--start", "2024-01-01", "--end", "2024-01-07",
        ])
        .unwrap();

        let Command::Show { city, start, end, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(city.as_deref(), Some("Lagos"));
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 7));
    }

    #[test]
    fn show_rejects_days_with_explicit_range() {
        let res = Cli::try_parse_from([
            "tempchart", "show", "--days", "7", "--start", "2024-01-01", "--end", "2024-01-07",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn start_requires_end() {
        assert!(Cli::try_parse_from(["tempchart", "show", "--start", "2024-01-01"]).is_err());
    }
}
