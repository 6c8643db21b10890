use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_aggregator_core::models::hourly::PeriodChange;
use portfolio_aggregator_core::models::settings::Settings;
use portfolio_aggregator_core::models::snapshot::PortfolioSnapshot;
use portfolio_aggregator_core::services::progress::LogIndicator;
use portfolio_aggregator_core::PortfolioDashboard;

/// Aggregate exchange holdings behind the proxy and keep them fresh.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file. Defaults are used when it does not exist.
    #[arg(short, long, default_value = "portfolio.toml")]
    config: PathBuf,

    /// Refresh once, print the summary and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,portfolio_aggregator_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = if cli.config.exists() {
        Settings::load(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
        Settings::from_env().context("building default settings")?
    };

    let dashboard = PortfolioDashboard::from_settings(&settings, Arc::new(LogIndicator))
        .context("setting up the dashboard")?;

    let snapshot = dashboard
        .initialize()
        .await
        .context("initial portfolio load")?;
    print_snapshot(&snapshot, dashboard.current_period_change());

    if cli.once {
        dashboard.stop_background_refresh();
        return Ok(());
    }

    let mut updates = dashboard.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            event = updates.recv() => match event {
                Ok(event) => {
                    info!(event = event.name(), at = %event.timestamp, "portfolio refreshed");
                    if let Some(snapshot) = dashboard.current_snapshot() {
                        print_snapshot(&snapshot, dashboard.current_period_change());
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "missed update notifications"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    dashboard.stop_background_refresh();
    Ok(())
}

fn print_snapshot(snapshot: &PortfolioSnapshot, change: Option<PeriodChange>) {
    let summary = &snapshot.summary;
    println!();
    println!(
        "Portfolio @ {}  total ${:.2}  ({} assets)",
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
        summary.total_value,
        summary.unique_asset_count
    );
    if let Some(change) = change {
        println!(
            "24h: {:+.2}%  P&L {:+.2}",
            change.percent_change_24h, change.absolute_pnl_24h
        );
    }
    println!("{:<10} {:>16} {:>14} {:>10} {:>4}", "Asset", "Amount", "Value", "24h %", "Ex");
    for top in &summary.top_assets_by_value {
        let Some(asset) = snapshot.merged_assets.get(&top.key) else {
            continue;
        };
        println!(
            "{:<10} {:>16.8} {:>14.2} {:>9.2}% {:>4}",
            asset.symbol, asset.total_amount, top.value, asset.change_24h_percent, top.exchange_count
        );
    }
    if !snapshot.multi_exchange_symbols.is_empty() {
        println!("On several exchanges: {}", snapshot.multi_exchange_symbols.join(", "));
    }
}
