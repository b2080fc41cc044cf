//! Stale Ticket Bot
//!
//! Loads the rule configuration, connects to Jira and runs every selected
//! rule once. Meant to be invoked periodically, e.g. from cron or CI.

use anyhow::{Context, Result};
use clap::Parser;
use stalebot::cli::{Cli, Commands};
use stalebot::config::BotConfig;
use stalebot::errors::{ActionableError, ConfigError};
use stalebot::output::{writeln_safe, ExitCode, JsonOutput};
use stalebot::rules::{RuleReport, RuleSummary};
use stalebot::{ExecutionMode, JiraClient, RuleSet};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn report_error(error: &anyhow::Error) {
    match error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>())
    {
        Some(config_error) => {
            let mut actionable = ActionableError::from(config_error);
            if error.to_string() != config_error.to_string() {
                actionable = actionable.with_cause(error.to_string());
            }
            eprint!("{}", actionable);
        }
        None => eprintln!("Error: {:#}", error),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let exit_code = match run(cli) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            report_error(&e);
            ExitCode::from_error(&e)
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            config,
            dry_run,
            rules,
            json,
        } => run_rules(&config, dry_run, &rules, json),
        Commands::CheckConfig { config } => {
            let bot_config = BotConfig::from_file(&config)?;
            writeln_safe(format!(
                "{}: {} rule(s) OK",
                config.display(),
                bot_config.rules.len()
            ))?;
            Ok(())
        }
        Commands::ListRules { config, json } => {
            let bot_config = BotConfig::from_file(&config)?;
            let summaries: Vec<RuleSummary> = bot_config
                .rules
                .iter()
                .map(|rule| RuleSummary::from_config(rule, &bot_config.tracker))
                .collect();

            if json {
                let output = JsonOutput::success(summaries, "list-rules", false);
                writeln_safe(output.to_json_string()?)?;
            } else {
                for summary in &summaries {
                    writeln_safe(format!(
                        "{} ({:?}): warn after {} days, finalize after {} more",
                        summary.name, summary.kind, summary.stale_days, summary.warning_days
                    ))?;
                    writeln_safe(format!("  candidates: {}", summary.candidate_query))?;
                    writeln_safe(format!("  warned:     {}", summary.warned_query))?;
                }
            }
            Ok(())
        }
    }
}

fn run_rules(config_path: &Path, dry_run: bool, selected: &[String], json: bool) -> Result<()> {
    let config = BotConfig::from_file(config_path)?;
    let rule_set = RuleSet::from_config(&config, selected)?;
    let mode = ExecutionMode::from_dry_run(dry_run);

    // Dry runs only read, which many trackers allow anonymously
    let token = if mode.is_dry_run() {
        config.tracker.token()
    } else {
        Some(config.tracker.require_token()?)
    };

    let client = JiraClient::new(
        &config.tracker.url,
        token,
        Duration::from_secs(config.tracker.timeout_secs),
    );
    info!(
        "Connected to {} ({} mode), running {} rule(s)",
        client.base_url(),
        mode,
        rule_set.names().len()
    );

    let reports = rule_set
        .run_all(&client, mode)
        .context("Stale ticket run aborted")?;

    print_reports(&reports, mode, json)
}

fn print_reports(reports: &[RuleReport], mode: ExecutionMode, json: bool) -> Result<()> {
    if json {
        let output = JsonOutput::success(reports, "run", mode.is_dry_run());
        writeln_safe(output.to_json_string()?)?;
        return Ok(());
    }

    for report in reports {
        writeln_safe(format!(
            "{}: finalized {}/{}, marked stale {}/{} ({} skipped)",
            report.rule,
            report.finalized.changed,
            report.finalized.examined,
            report.marked.changed,
            report.marked.examined,
            report.marked.skipped
        ))?;
    }
    Ok(())
}
