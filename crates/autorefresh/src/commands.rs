use std::time::Duration;

use clap::ArgMatches;
use tracing::{error, warn};

use autorefresh_core::config::WatchdogConfig;
use autorefresh_core::events;

use crate::simulate::{self, SimulationPlan, SimulationReport, Signals};

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
fn load_config_with_warning() -> WatchdogConfig {
    match WatchdogConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.autorefresh/config.toml and ./.autorefresh/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            WatchdogConfig::default()
        }
    }
}

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    let result = match matches.subcommand() {
        Some(("simulate", sub_matches)) => handle_simulate_command(sub_matches),
        Some(("config", sub_matches)) => handle_config_command(sub_matches),
        _ => {
            error!(event = "cli.command.unknown");
            Err("Unknown command".into())
        }
    };

    if let Err(e) = &result {
        events::log_app_error(&**e);
    }
    events::log_app_shutdown();
    result
}

fn millis(matches: &ArgMatches, name: &str) -> Option<u64> {
    matches.get_one::<u64>(name).copied()
}

fn handle_simulate_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config_with_warning();
    if let Some(cadence) = millis(matches, "cadence-ms") {
        config.trigger.cadence_ms = Some(cadence);
    }
    if let Some(retry) = millis(matches, "retry-delay-ms") {
        config.poll.retry_delay_ms = Some(retry);
    }
    if let Some(delay) = millis(matches, "document-delay-ms") {
        config.poll.document_loaded_delay_ms = Some(delay);
    }

    let signals = matches
        .get_one::<String>("signals")
        .and_then(|raw| Signals::parse(raw))
        .unwrap_or(Signals::Both);

    let control_gaps = matches
        .get_many::<(u64, u64)>("control-gap")
        .map(|gaps| {
            gaps.map(|(start, end)| (Duration::from_millis(*start), Duration::from_millis(*end)))
                .collect()
        })
        .unwrap_or_default();

    let plan = SimulationPlan {
        duration: Duration::from_millis(millis(matches, "duration-ms").unwrap_or(16000)),
        region_after: Duration::from_millis(millis(matches, "region-after-ms").unwrap_or(2500)),
        ui_loaded_at: Duration::from_millis(millis(matches, "ui-loaded-at-ms").unwrap_or(0)),
        signals,
        control_gaps,
    };

    // Single-threaded runtime: every timer and signal callback runs on one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let report = runtime.block_on(simulate::run(plan, config))?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    let stats = &report.status.trigger;
    println!("Simulation finished after {}ms", report.duration_ms);
    println!("  UI mounted at:    {}ms", report.region_after_ms);
    println!("  Poll state:       {:?}", report.status.poll_state);
    println!("  Poll checks:      {}", report.status.poll_checks);
    println!("  Trigger starts:   {}", stats.starts);
    println!("  Ticks:            {}", stats.ticks);
    println!("  Activations:      {}", report.activations);
    println!("  Skipped (absent): {}", stats.skipped);
    println!("  Failed:           {}", stats.failed);
}

fn handle_config_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = WatchdogConfig::load_hierarchy()?.resolved();

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string(&config)?);
    }

    Ok(())
}
