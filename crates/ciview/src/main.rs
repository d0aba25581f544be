//! ciview - live GitLab CI pipeline viewer.

mod polling;
mod viewer;

use ciview_cli::{Args, PipelineSelector};
use ciview_gitlab::{GitLabClient, Pipeline, ProjectId};
use ciview_monitor::App;
use ciview_state::{PipelineRef, PipelineSummary};
use clap::Parser;
use crossterm::{
    cursor, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use miette::{Context, IntoDiagnostic, Result, miette};
use polling::{PollTarget, Poller, PollingConfig};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;
use viewer::{Tui, Viewer};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let client = Arc::new(GitLabClient::new(&args.host, args.token.clone()).into_diagnostic()?);
    let project = ProjectId::from(args.repo.as_str());
    let pipeline = resolve_pipeline(&client, &project, args.selector()).await?;

    if args.web {
        println!("Opening {} in your browser.", pipeline.web_url);
        return open_in_browser(&pipeline.web_url);
    }

    let root = PipelineRef::new(
        project,
        pipeline.id,
        Some(pipeline.sha.clone()).filter(|sha| !sha.is_empty()),
    );
    let mut app = App::new(root.clone(), PipelineSummary::from(&pipeline));
    let config = args.viewer_config();

    let (target_tx, target_rx) = watch::channel(PollTarget {
        pipeline: root,
        paused: false,
    });
    let (poll_tx, poll_rx) = mpsc::channel(16);
    let poller = Poller::new(
        Arc::clone(&client),
        target_rx,
        poll_tx,
        PollingConfig {
            interval: config.poll_interval,
            ..PollingConfig::default()
        },
    )
    .start();

    install_panic_hook();
    let mut terminal = setup_terminal().into_diagnostic()?;

    let mut viewer = Viewer::new(client, config);
    let res = viewer.run(&mut terminal, &mut app, poll_rx, target_tx).await;

    poller.abort();
    restore_terminal().into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    res.into_diagnostic()
}

/// Send logs to `path`; without a path nothing is logged, the terminal
/// belongs to the viewer.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Find the pipeline to show.
async fn resolve_pipeline(
    client: &GitLabClient,
    project: &ProjectId,
    selector: PipelineSelector,
) -> Result<Pipeline> {
    let id = match selector {
        PipelineSelector::Id(id) => id,
        PipelineSelector::Branch(branch) => {
            let branch = match branch {
                Some(branch) => branch,
                None => current_branch().await?,
            };
            let commit = client
                .commit(project, &branch)
                .await
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to resolve {}", branch))?;
            commit
                .last_pipeline
                .map(|p| p.id)
                .ok_or_else(|| miette!("Can't find pipeline for commit: {}", commit.id))?
        }
    };
    tracing::info!("Showing pipeline {} of {}", id, project);
    client
        .pipeline(project, id)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to get pipeline {}", id))
}

async fn current_branch() -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .await
        .into_diagnostic()
        .wrap_err("failed to run git")?;
    if !output.status.success() {
        return Err(miette!(
            "could not determine the current branch; pass one with --branch"
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn open_in_browser(url: &str) -> Result<()> {
    let opener = std::env::var("BROWSER").unwrap_or_else(|_| {
        if cfg!(target_os = "macos") {
            "open".to_string()
        } else {
            "xdg-open".to_string()
        }
    });
    std::process::Command::new(&opener)
        .arg(url)
        .spawn()
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to launch {}", opener))?;
    Ok(())
}

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}

/// Put the terminal back before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
