//! cscan - container image vulnerability scan client
//!
//! Submits scans to a scan backend, follows their progress and renders the
//! reconciled results.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod report;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::report::{CommandResult, ComparisonReport, ScanReport};
use clap::Parser;
use cscan_config::Config;
use cscan_errors::Error;
use cscan_events::{EventEmitter, EventReceiver, EventSender};
use cscan_net::ScanBackend;
use cscan_session::{CatalogClient, ScanController, ScanOutcome};
use cscan_types::{ColorChoice, OutputFormat, ScanResult};
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

/// Everything a command needs to run
struct CommandCtx {
    backend: Arc<dyn ScanBackend>,
    config: Config,
    tx: EventSender,
}

impl EventEmitter for CommandCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting cscan v{}", env!("CARGO_PKG_VERSION"));

    // defaults, then file, then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    let color = if config.general.default_output == OutputFormat::Plain {
        ColorChoice::Never
    } else {
        config.general.color
    };

    let (event_sender, event_receiver) = cscan_events::channel();
    let backend: Arc<dyn ScanBackend> = Arc::new(cscan_net::backend_from_config(&config)?);
    let ctx = CommandCtx {
        backend,
        config,
        tx: event_sender,
    };

    let renderer = OutputRenderer::new(json_output, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_output);

    let result =
        execute_command_with_events(cli.command, ctx, event_receiver, &mut event_handler).await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ctx: CommandCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: CommandCtx) -> Result<CommandResult, CliError> {
    match command {
        Commands::Scan {
            image,
            severity,
            limit,
            ..
        } => {
            let result = scan_image(&ctx, &image).await?;
            let limit = limit.unwrap_or(ctx.config.scan.display_limit);
            Ok(CommandResult::Scan(Box::new(ScanReport::new(
                result, severity, limit,
            ))))
        }

        Commands::Report {
            name,
            severity,
            limit,
        } => {
            let result = stored_report(&ctx, &name).await?;
            let limit = limit.unwrap_or(ctx.config.scan.display_limit);
            Ok(CommandResult::Scan(Box::new(ScanReport::new(
                result, severity, limit,
            ))))
        }

        Commands::Catalog => {
            let mut catalog = CatalogClient::new(Arc::clone(&ctx.backend), ctx.tx.clone());
            Ok(CommandResult::Catalog(catalog.entries().await.to_vec()))
        }

        Commands::Compare {
            baseline,
            candidate,
            stored,
        } => {
            ctx.emit_operation_started(format!("compare {baseline} {candidate}"));
            let pair = if stored {
                tokio::try_join!(
                    stored_report(&ctx, &baseline),
                    stored_report(&ctx, &candidate)
                )
            } else {
                tokio::try_join!(scan_image(&ctx, &baseline), scan_image(&ctx, &candidate))
            };
            let (baseline, candidate) = match pair {
                Ok(pair) => pair,
                Err(e) => {
                    ctx.emit_operation_failed("compare", e.to_string());
                    return Err(e);
                }
            };
            let comparison = cscan_reconcile::compare(&baseline, &candidate);
            ctx.emit_operation_completed("compare", true);
            Ok(CommandResult::Comparison(Box::new(ComparisonReport {
                baseline,
                candidate,
                comparison,
            })))
        }

        Commands::Health => Ok(CommandResult::Health(ctx.backend.health().await?)),
    }
}

/// Run one scan to a terminal state on its own controller.
///
/// Ctrl-C stops polling; the backend job is left alone.
async fn scan_image(ctx: &CommandCtx, image: &str) -> Result<ScanResult, CliError> {
    let mut controller =
        ScanController::new(Arc::clone(&ctx.backend), &ctx.config.scan, ctx.tx.clone());
    controller.submit(image).await?;

    let outcome = select! {
        outcome = controller.run_to_completion() => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.cancel();
            return Err(Error::Cancelled.into());
        }
    };

    match outcome {
        ScanOutcome::Completed(result) => Ok(*result),
        ScanOutcome::Failed(session) => Err(CliError::ScanFailed {
            image: session.image_reference,
            message: session.message,
        }),
        ScanOutcome::ResultUnavailable(error) => Err(error.into()),
        ScanOutcome::Inactive => Err(Error::Cancelled.into()),
    }
}

/// Load a report the backend keeps under `name`.
async fn stored_report(ctx: &CommandCtx, name: &str) -> Result<ScanResult, CliError> {
    let raw = ctx.backend.stored_scan(name).await?;
    Ok(cscan_reconcile::normalize(raw))
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode && !debug_enabled {
        // keep stdout parseable
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        // structured JSON logs on stderr
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,cscan=debug,cscan_session=debug")
                }),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &cli::GlobalArgs,
    command: &cli::Commands,
) -> Result<(), CliError> {
    if let Some(color) = &global.color {
        config.general.color = *color;
    }
    if let Some(url) = &global.backend_url {
        config.backend.base_url.clone_from(url);
    }
    if let cli::Commands::Scan {
        poll_interval_ms: Some(interval),
        ..
    } = command
    {
        if *interval == 0 {
            return Err(CliError::InvalidArguments(
                "--poll-interval-ms must be greater than zero".to_string(),
            ));
        }
        config.scan.poll_interval_ms = *interval;
    }
    config.validate()?;
    Ok(())
}
