//! CLI argument parsing for ciview.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ciview")]
#[command(version)]
#[command(about = "Watch a GitLab CI pipeline as a live job graph")]
pub struct Args {
    /// Branch whose latest pipeline is shown
    #[arg(value_name = "BRANCH", conflicts_with_all = ["branch", "pipeline_id"])]
    pub branch_arg: Option<String>,

    /// Branch whose latest pipeline is shown (defaults to the current git branch)
    #[arg(short, long, conflicts_with = "pipeline_id")]
    pub branch: Option<String>,

    /// Show this pipeline instead of the branch's latest one
    #[arg(short, long)]
    pub pipeline_id: Option<u64>,

    /// Open the pipeline in a browser instead of the viewer
    #[arg(short, long)]
    pub web: bool,

    /// Project as GROUP/NAME or numeric id
    #[arg(short = 'R', long, value_name = "GROUP/NAME")]
    pub repo: String,

    /// GitLab instance URL
    #[arg(long, env = "GITLAB_HOST", default_value = "https://gitlab.com")]
    pub host: String,

    /// Personal access token
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Job poll interval in seconds
    #[arg(long, default_value = "5")]
    pub poll_interval: u64,

    /// Write logs to this file
    #[arg(long, env = "CIVIEW_LOG")]
    pub log_file: Option<PathBuf>,
}

/// Which pipeline to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineSelector {
    /// Latest pipeline of the branch; `None` means the current git branch
    Branch(Option<String>),
    Id(u64),
}

impl Args {
    pub fn selector(&self) -> PipelineSelector {
        match self.pipeline_id {
            Some(id) => PipelineSelector::Id(id),
            None => PipelineSelector::Branch(self.branch.clone().or_else(|| self.branch_arg.clone())),
        }
    }

    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            poll_interval: Duration::from_secs(self.poll_interval.max(1)),
            ..ViewerConfig::default()
        }
    }
}

/// Timing of the viewer loop and its background tasks.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Interval between job fetches.
    pub poll_interval: Duration,
    /// Interval between trace fetches of a log session.
    pub log_interval: Duration,
    /// Redraw interval so running durations advance.
    pub tick_rate: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            log_interval: Duration::from_secs(3),
            tick_rate: Duration::from_secs(1),
        }
    }
}
