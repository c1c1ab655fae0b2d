//! Save & Serve - surplus food donation planner
//!
//! Forecasts a restaurant's leftover food for a day and time slot and routes
//! it to nearby donation centers.
//!
//! # Usage
//!
//! ```bash
//! # List the restaurants, days, slots and items the loaded data knows about
//! save-and-serve options
//!
//! # Plan today's lunch surplus for two items
//! save-and-serve plan --restaurant "Spice Garden" --slot Lunch --item Rice --item Chapati
//!
//! # Serve the JSON API
//! save-and-serve serve --addr 0.0.0.0:8080
//! ```
//!
//! # Environment Variables
//!
//! - `SAVE_SERVE_CONFIG`: Path to the TOML config (default: ./save_serve.toml)
//! - `SAVE_SERVE_CORS_ORIGINS`: Comma-separated origins allowed by the API
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use chrono::{Datelike, Weekday};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use save_and_serve::api::{create_app, ApiState};
use save_and_serve::planner::{DonationPlanner, ItemReport, PlanReport, PlanRequest};
use save_and_serve::ServeConfig;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "save-and-serve")]
#[command(about = "Forecast restaurant food surplus and route it to donation centers")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides SAVE_SERVE_CONFIG and ./save_serve.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// List restaurants, days, time slots and food items
    Options {
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Forecast surplus and allocate it to donation centers
    Plan {
        /// Restaurant name as it appears in the distance table
        #[arg(short, long)]
        restaurant: String,
        /// Day label (default: today's weekday)
        #[arg(short, long)]
        day: Option<String>,
        /// Time slot label (default: first known slot)
        #[arg(short, long)]
        slot: Option<String>,
        /// Food item to plan; repeat for several items
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API
    Serve {
        /// Override the listen address from config
        #[arg(short, long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<ServeConfig> {
    match path {
        Some(p) => ServeConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => ServeConfig::load().context("Failed to load config"),
    }
}

fn load_planner(config: &ServeConfig) -> Result<DonationPlanner> {
    DonationPlanner::from_config(config).context("Failed to build donation planner")
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn print_item(report: &ItemReport) {
    println!();
    println!(
        "{}: expected surplus {} {} (model {:.2} ± {:.2})",
        report.item, report.quantity, report.unit, report.forecast.quantity, report.forecast.spread
    );
    for a in &report.plan.allocations {
        println!(
            "  -> {:<28} {:>6.1} km  send {:>5} {}  contact {}",
            a.center.name, a.center.distance_km, a.quantity, report.unit, a.center.contact
        );
    }
    if let Some(w) = &report.warning {
        println!("  ! {} ({})", w, report.unit);
    }
}

fn print_report(report: &PlanReport) {
    println!(
        "Donation plan for {} on {} ({})",
        report.restaurant, report.day, report.slot
    );
    for item in &report.items {
        print_item(item);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_ref())?;

    match args.command {
        SubCommand::Config => {
            print!("{}", config.to_toml().context("Failed to serialize config")?);
        }

        SubCommand::Options { json } => {
            let options = load_planner(&config)?.options();
            if json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                println!("Restaurants: {}", options.restaurants.join(", "));
                println!("Days:        {}", options.days.join(", "));
                println!("Time slots:  {}", options.slots.join(", "));
                println!("Food items:  {}", options.items.join(", "));
            }
        }

        SubCommand::Plan {
            restaurant,
            day,
            slot,
            items,
            json,
        } => {
            let planner = load_planner(&config)?;
            let day = day.unwrap_or_else(|| {
                weekday_name(chrono::Local::now().weekday()).to_string()
            });
            let slot = match slot {
                Some(s) => s,
                None => planner
                    .bank()
                    .slot_classes()
                    .first()
                    .cloned()
                    .context("Food log has no time slots")?,
            };

            let request = PlanRequest {
                restaurant,
                day,
                slot,
                items,
            };
            let report = planner.plan(&request).context("Planning failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        SubCommand::Serve { addr } => {
            let planner = load_planner(&config)?;
            let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let app = create_app(ApiState::new(planner));

            let listener = tokio::net::TcpListener::bind(&server_addr)
                .await
                .with_context(|| format!("Failed to bind to {}", server_addr))?;
            info!(addr = %server_addr, "HTTP server listening");

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for shutdown signal");
                        std::future::pending::<()>().await;
                    }
                    info!("Received shutdown signal");
                })
                .await
                .context("HTTP server error")?;
            info!("Graceful shutdown complete");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_names_match_food_log_labels() {
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }

    #[test]
    fn test_cli_parses_repeated_items() {
        let args = CliArgs::parse_from([
            "save-and-serve",
            "plan",
            "--restaurant",
            "Spice Garden",
            "--item",
            "Rice",
            "--item",
            "Chapati",
        ]);
        match args.command {
            SubCommand::Plan { items, day, .. } => {
                assert_eq!(items, vec!["Rice", "Chapati"]);
                assert!(day.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
