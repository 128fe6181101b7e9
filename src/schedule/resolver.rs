//! Attributing list-feed rows to calendar days.
//!
//! The feed announces each day once, in a marker cell (`09.12(금)`), and every
//! following game row belongs to that day until the next marker. Resolution is a
//! left-to-right fold carrying [`DayState`]; row order is significant.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::schedule::game::{find_time, matchup_tokens, matchup_vs, pick_details};
use crate::schedule::rows::ScheduleRow;
use crate::types::ScheduleGame;

static DAY_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[./](\d{1,2})").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayState {
    NoActiveDay,
    DayActive { date: NaiveDate, label: String },
}

impl DayState {
    /// State after reading `row`. Markers whose digits don't form a real date
    /// in `year` leave the state alone.
    pub fn advance(self, row: &ScheduleRow, year: i32) -> DayState {
        let Some(label) = row.day_label() else {
            return self;
        };
        match parse_day_label(&label, year) {
            Some(date) => DayState::DayActive { date, label },
            None => self,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DayState::NoActiveDay => None,
            DayState::DayActive { date, .. } => Some(*date),
        }
    }
}

pub fn parse_day_label(label: &str, year: i32) -> Option<NaiveDate> {
    let caps = DAY_DIGITS.captures(label)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Ways a row can be attributed to the requested day, tried in order.
struct DayMatcher {
    target: NaiveDate,
    explicit: Regex,
    label_prefixes: [String; 2],
}

impl DayMatcher {
    fn new(target: NaiveDate) -> Self {
        let (y, m, d) = (target.year(), target.month(), target.day());
        // 2025-09-12 / 2025.9.12, 09.12 / 09/12, 20250912
        let pattern = format!(r"{y}[-./]0?{m}[-./]0?{d}(?:\D|$)|(?:^|\D){m:02}[./]{d:02}(?:\D|$)|{y}{m:02}{d:02}");
        Self {
            target,
            explicit: Regex::new(&pattern).expect("valid date pattern"),
            label_prefixes: [format!("{m:02}.{d:02}"), format!("{m}.{d}")],
        }
    }

    fn belongs(&self, row: &ScheduleRow, state: &DayState) -> bool {
        if self.explicit.is_match(&row.text()) {
            return true;
        }
        match state {
            DayState::NoActiveDay => false,
            DayState::DayActive { date, label } => {
                *date == self.target || self.label_prefixes.iter().any(|p| label.starts_with(p.as_str()))
            }
        }
    }
}

/// The game described by `row`, if both teams can be identified.
pub fn game_from_row(row: &ScheduleRow) -> Option<ScheduleGame> {
    let values = row.values();
    let text = values.join(" ");

    let mut game = ScheduleGame {
        time: row.cell_by_class("time").and_then(|c| find_time(&c.plain())),
        ..Default::default()
    };

    let play = row.cell_by_class("play").map(|c| c.plain()).filter(|s| !s.is_empty());
    let matchup = matchup_vs(play.as_deref().unwrap_or(&text)).or_else(|| matchup_tokens(&text))?;
    matchup.apply(&mut game);
    pick_details(&values, &mut game);
    Some(game)
}

/// Games on `target`, tagged with its date.
pub fn resolve_day(rows: &[ScheduleRow], target: NaiveDate) -> Vec<ScheduleGame> {
    let matcher = DayMatcher::new(target);
    let ymd = target.format("%Y-%m-%d").to_string();

    let (_, games) = rows.iter().fold(
        (DayState::NoActiveDay, Vec::new()),
        |(state, mut games), row| {
            let state = state.advance(row, target.year());
            if matcher.belongs(row, &state) {
                if let Some(game) = game_from_row(row) {
                    games.push(ScheduleGame { date: Some(ymd.clone()), ..game });
                }
            }
            (state, games)
        },
    );
    games
}

/// Every game that follows a day marker, tagged with that day.
pub fn resolve_month(rows: &[ScheduleRow], year: i32) -> Vec<ScheduleGame> {
    let (_, games) = rows.iter().fold(
        (DayState::NoActiveDay, Vec::new()),
        |(state, mut games), row| {
            let state = state.advance(row, year);
            if let Some(date) = state.date() {
                if let Some(game) = game_from_row(row) {
                    let date = date.format("%Y-%m-%d").to_string();
                    games.push(ScheduleGame { date: Some(date), ..game });
                }
            }
            (state, games)
        },
    );
    games
}
