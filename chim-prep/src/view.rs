//! Read-only view of the preparation page
//!
//! Everything here is derived from [`PrepareState`] on demand; nothing is
//! stored, so the checkboxes and counters can never drift from the rows.

use crate::selection::BulkCheckState;
use crate::state::PrepareState;
use chim_common::models::{ImportChannel, ImportUser};
use serde::Serialize;

/// Progress bar shown while preparing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressIndicator {
    /// No usable rate yet
    Indeterminate,
    /// `per_mille` is on a 0-1000 scale
    Determinate { per_mille: u16, percent: u8 },
}

impl ProgressIndicator {
    /// Indicator for a pushed percentage; unset, zero and non-finite rates
    /// fall back to the indeterminate bar
    pub fn from_rate(rate: Option<f64>) -> Self {
        match rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => {
                let rate = rate.min(100.0);
                ProgressIndicator::Determinate {
                    per_mille: (rate * 10.0).round() as u16,
                    percent: rate.round() as u8,
                }
            }
            _ => ProgressIndicator::Indeterminate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub is_deleted: bool,
    pub do_import: bool,
}

impl From<&ImportUser> for UserRow {
    fn from(user: &ImportUser) -> Self {
        Self {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_deleted: user.is_deleted,
            do_import: user.do_import,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRow {
    pub channel_id: String,
    pub name: String,
    pub is_archived: bool,
    pub do_import: bool,
}

impl From<&ImportChannel> for ChannelRow {
    fn from(channel: &ImportChannel) -> Self {
        Self {
            channel_id: channel.channel_id.clone(),
            name: channel.name.clone(),
            is_archived: channel.is_archived,
            do_import: channel.do_import,
        }
    }
}

/// Snapshot handed to whatever renders the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrepareView {
    pub preparing: bool,
    pub progress: ProgressIndicator,
    /// Untranslated label key of the recorded phase
    pub status_label: Option<String>,
    pub message_count: u64,
    pub users_selected: usize,
    pub users_total: usize,
    pub channels_selected: usize,
    pub channels_total: usize,
    pub users_bulk: BulkCheckState,
    pub channels_bulk: BulkCheckState,
    pub importing: bool,
    pub can_start: bool,
    pub users: Vec<UserRow>,
    pub channels: Vec<ChannelRow>,
}

impl PrepareView {
    pub fn from_state(state: &PrepareState) -> Self {
        let users = &state.selection.users;
        let channels = &state.selection.channels;

        Self {
            preparing: state.preparing,
            progress: ProgressIndicator::from_rate(state.progress_rate),
            status_label: state.status.as_ref().map(|phase| phase.status_label_key()),
            message_count: state.message_count,
            users_selected: users.selected_count(),
            users_total: users.len(),
            channels_selected: channels.selected_count(),
            channels_total: channels.len(),
            users_bulk: users.bulk_state(),
            channels_bulk: channels.bulk_state(),
            importing: state.importing,
            can_start: !state.importing && !state.preparing,
            users: users.rows().iter().map(UserRow::from).collect(),
            channels: channels.rows().iter().map(ChannelRow::from).collect(),
        }
    }
}
