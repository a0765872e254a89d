//! Command-line arguments

use chim_common::config::ConfigOverrides;
use clap::parser::ValueSource;
use clap::{ArgMatches, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "chim-prep", version, about = "Prepare and start a chat import")]
pub struct Cli {
    /// Config file (default: $CHIM_CONFIG or <config dir>/chim/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Server base URL
    #[arg(long)]
    pub server: Option<String>,

    #[arg(long)]
    pub user_id: Option<String>,

    #[arg(long)]
    pub auth_token: Option<String>,

    /// Delay between two status polls
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Flip one account's selection (repeatable)
    #[arg(long, value_name = "ID")]
    pub toggle_user: Vec<String>,

    /// Flip one channel's selection (repeatable)
    #[arg(long, value_name = "ID")]
    pub toggle_channel: Vec<String>,

    /// Click a header checkbox (repeatable)
    #[arg(long, value_enum, value_name = "LIST")]
    pub toggle_all: Vec<BulkTarget>,

    /// Start the import after applying the edits
    #[arg(long)]
    pub start: bool,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BulkTarget {
    Users,
    Channels,
}

/// One selection action requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEdit {
    ToggleUser(String),
    ToggleChannel(String),
    ToggleAllUsers,
    ToggleAllChannels,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server_url: self.server.clone(),
            user_id: self.user_id.clone(),
            auth_token: self.auth_token.clone(),
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

/// Selection edits in the order they appeared on the command line
pub fn edits_in_order(matches: &ArgMatches) -> Vec<SelectionEdit> {
    let mut edits: Vec<(usize, SelectionEdit)> = Vec::new();
    let given = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);

    for (id, make) in [
        ("toggle_user", SelectionEdit::ToggleUser as fn(String) -> SelectionEdit),
        ("toggle_channel", SelectionEdit::ToggleChannel),
    ] {
        if !given(id) {
            continue;
        }
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<String>(id))
        {
            edits.extend(indices.zip(values.cloned().map(make)));
        }
    }

    if given("toggle_all") {
        if let (Some(indices), Some(targets)) = (
            matches.indices_of("toggle_all"),
            matches.get_many::<BulkTarget>("toggle_all"),
        ) {
            edits.extend(indices.zip(targets.map(|target| match target {
                BulkTarget::Users => SelectionEdit::ToggleAllUsers,
                BulkTarget::Channels => SelectionEdit::ToggleAllChannels,
            })));
        }
    }

    edits.sort_by_key(|(index, _)| *index);
    edits.into_iter().map(|(_, edit)| edit).collect()
}
