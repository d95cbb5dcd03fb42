//! Read-only reporting over finished games.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::db::{Player, PlayerRole};
use crate::store::{DayWindow, GameStore, IdentityLookup, PlayerDirectory, PlayerId, StoreError};

/// Failure of a reporting operation.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ReportError {
    /// The player id did not resolve.
    #[from(ignore)]
    #[display("Player {} not found", player_id)]
    PlayerNotFound {
        /// The missing id.
        player_id: PlayerId,
    },

    /// The date text could not be parsed.
    #[from(ignore)]
    #[display("Invalid date '{}': expected YYYY-MM-DD or an ISO-8601 date-time", input)]
    InvalidDate {
        /// The rejected input.
        input: String,
    },

    /// Infrastructure failure from the backend.
    #[display("{}", _0)]
    Storage(StoreError),
}

/// Totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    date: NaiveDate,
    #[serde(rename = "totalUsers")]
    total_players: i64,
    total_games: i64,
    games_won: i64,
}

/// One player's results for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDayStats {
    date: NaiveDate,
    attempts: i64,
    wins: i64,
}

/// Parses a report date from `YYYY-MM-DD` or an ISO-8601 date-time.
///
/// Only the date part of a date-time is used.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDate`] when no format matches.
#[instrument]
pub fn parse_report_date(input: &str) -> Result<NaiveDate, ReportError> {
    let text = input.trim();
    if let Ok(moment) = DateTime::parse_from_rfc3339(text) {
        return Ok(moment.date_naive());
    }
    if let Ok(moment) = text.parse::<NaiveDateTime>() {
        return Ok(moment.date());
    }
    text.parse::<NaiveDate>().map_err(|_| {
        warn!(input, "Unparseable report date");
        ReportError::InvalidDate {
            input: input.to_string(),
        }
    })
}

/// Service layer for aggregate statistics.
#[derive(Debug, Clone)]
pub struct ReportService<B> {
    backend: B,
}

impl<B> ReportService<B>
where
    B: IdentityLookup + PlayerDirectory + GameStore,
{
    /// Creates a report service over the backend.
    #[instrument(skip(backend))]
    pub fn new(backend: B) -> Self {
        info!("Creating ReportService");
        Self { backend }
    }

    /// Totals for `date`.
    ///
    /// Games count toward the day they finished on. Players count toward
    /// the day they started a game on, and only player accounts count.
    #[instrument(skip(self))]
    pub fn daily_report(&self, date: NaiveDate) -> Result<DailyReport, ReportError> {
        let window = DayWindow::for_date(date);
        let finished = self.backend.find_finished_between(&window)?;
        let total_players = self
            .backend
            .count_players_started_between(&window, PlayerRole::Player)?;
        let games_won = finished.iter().filter(|g| *g.won()).count() as i64;

        let report = DailyReport {
            date,
            total_players,
            total_games: finished.len() as i64,
            games_won,
        };
        debug!(?report, "Built daily report");
        Ok(report)
    }

    /// Per-day attempts and wins for one player, oldest day first.
    ///
    /// Unfinished games are left out.
    #[instrument(skip(self))]
    pub fn player_report(&self, player_id: PlayerId) -> Result<Vec<PlayerDayStats>, ReportError> {
        if self.backend.resolve(player_id)?.is_none() {
            return Err(ReportError::PlayerNotFound { player_id });
        }

        let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for game in self.backend.find_games_by_player(player_id)? {
            let Some(finished_at) = game.finished_at() else {
                continue;
            };
            let day = days.entry(finished_at.date()).or_default();
            day.0 += 1;
            if *game.won() {
                day.1 += 1;
            }
        }

        let stats: Vec<_> = days
            .into_iter()
            .map(|(date, (attempts, wins))| PlayerDayStats {
                date,
                attempts,
                wins,
            })
            .collect();
        debug!(player_id, days = stats.len(), "Built player report");
        Ok(stats)
    }

    /// Every player account (admins excluded).
    #[instrument(skip(self))]
    pub fn list_players(&self) -> Result<Vec<Player>, ReportError> {
        Ok(self.backend.list_players_by_role(PlayerRole::Player)?)
    }
}
