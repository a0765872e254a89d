//! chim-prep - command-line import preparation
//!
//! Waits for the current import to become selectable, applies the requested
//! selection edits, prints the page and optionally starts the import.

use anyhow::{anyhow, bail, Result};
use chim_common::config::resolve_client_config;
use chim_common::events::EventBus;
use chim_prep::cli::{edits_in_order, Cli, SelectionEdit};
use chim_prep::feed::ProgressFeed;
use chim_prep::view::{PrepareView, ProgressIndicator};
use chim_prep::{HttpBackend, PageSignal, PrepareImport, SubmitOutcome};
use clap::{CommandFactory, FromArgMatches};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const PROGRESS_PRINT_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let edits = edits_in_order(&matches);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting chim-prep v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = resolve_client_config(cli.config.as_deref(), &cli.overrides())?;
    info!(server = %config.server_url, poll_interval_ms = config.poll_interval_ms, "Configuration resolved");

    let backend = Arc::new(HttpBackend::new(&config)?);
    let bus = EventBus::new(config.event_capacity);

    let feed_cancel = CancellationToken::new();
    let feed = ProgressFeed::new(&config, bus.clone())?.spawn(feed_cancel.clone());

    let (mut page, mut signals) = PrepareImport::new(backend, config.poll_interval());
    page.mount(&bus).await;

    let result = drive(&page, &mut signals, &cli, &edits).await;

    page.teardown();
    feed_cancel.cancel();
    if let Err(e) = feed.await {
        warn!(error = %e, "Progress feed task ended abnormally");
    }

    result
}

async fn drive(
    page: &PrepareImport,
    signals: &mut mpsc::UnboundedReceiver<PageSignal>,
    cli: &Cli,
    edits: &[SelectionEdit],
) -> Result<()> {
    if !wait_until_prepared(page, signals, cli.json).await? {
        return Ok(());
    }

    for edit in edits {
        let applied = match edit {
            SelectionEdit::ToggleUser(id) => page.toggle_user(id).await.is_some(),
            SelectionEdit::ToggleChannel(id) => page.toggle_channel(id).await.is_some(),
            SelectionEdit::ToggleAllUsers => page.toggle_all_users().await.is_some(),
            SelectionEdit::ToggleAllChannels => page.toggle_all_channels().await.is_some(),
        };
        if !applied {
            warn!(?edit, "Selection edit ignored (unknown id)");
        }
    }

    print_view(&page.view().await, cli.json)?;

    if !cli.start {
        return Ok(());
    }

    match page.start_import().await {
        SubmitOutcome::Started => {
            // The page redirects to the progress view
            if let Ok(PageSignal::Redirect(route)) = signals.try_recv() {
                println!("Import started; continue at {}", route);
            } else {
                println!("Import started");
            }
            Ok(())
        }
        SubmitOutcome::Failed(failure) => bail!("{}", failure.notice.message),
        SubmitOutcome::AlreadyInFlight => bail!("an import start is already in flight"),
        SubmitOutcome::NotReady => bail!("import is not ready to start"),
    }
}

/// Block until the selection is editable, printing progress meanwhile
///
/// `Ok(false)` means the page redirected elsewhere without an error.
async fn wait_until_prepared(
    page: &PrepareImport,
    signals: &mut mpsc::UnboundedReceiver<PageSignal>,
    quiet: bool,
) -> Result<bool> {
    let mut ticker = tokio::time::interval(PROGRESS_PRINT_INTERVAL);
    let mut failure: Option<String> = None;

    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Some(PageSignal::Prepared) => return Ok(true),
                Some(PageSignal::Notify(notice)) => {
                    eprintln!("error: {}", notice.message);
                    failure = Some(notice.message);
                }
                Some(PageSignal::Redirect(route)) => {
                    return match failure {
                        Some(message) => Err(anyhow!("{} (redirected to {})", message, route)),
                        None => {
                            println!("Nothing to prepare; continue at {}", route);
                            Ok(false)
                        }
                    };
                }
                None => bail!("import preparation stopped unexpectedly"),
            },
            _ = ticker.tick(), if !quiet => {
                let view = page.view().await;
                print_progress(&view);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                page.back_to_imports();
                bail!("interrupted");
            }
        }
    }
}

fn print_progress(view: &PrepareView) {
    let status = view.status_label.as_deref().unwrap_or("importer_status_waiting");
    match view.progress {
        ProgressIndicator::Determinate { percent, .. } => eprintln!("{} {}%", status, percent),
        ProgressIndicator::Indeterminate => eprintln!("{} ...", status),
    }
}

fn print_view(view: &PrepareView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("Messages: {}", view.message_count);
    println!(
        "Users: {}/{} selected{}",
        view.users_selected,
        view.users_total,
        if view.users_bulk.indeterminate { " (partial)" } else { "" }
    );
    for user in &view.users {
        println!(
            "  [{}] {} {} <{}>{}",
            if user.do_import { "x" } else { " " },
            user.user_id,
            user.username,
            user.email,
            if user.is_deleted { " (deleted)" } else { "" }
        );
    }
    println!(
        "Channels: {}/{} selected{}",
        view.channels_selected,
        view.channels_total,
        if view.channels_bulk.indeterminate { " (partial)" } else { "" }
    );
    for channel in &view.channels {
        println!(
            "  [{}] {} {}{}",
            if channel.do_import { "x" } else { " " },
            channel.channel_id,
            channel.name,
            if channel.is_archived { " (archived)" } else { "" }
        );
    }
    Ok(())
}
