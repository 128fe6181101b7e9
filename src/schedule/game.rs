//! Picking game fields out of loosely structured row text.
//!
//! Shared by the list-feed resolver and the HTML fallback. Upstream writes
//! matchups away-team first: `원정 [점수] vs [점수] 홈`.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::fields::norm_count;
use crate::types::ScheduleGame;

static VS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z가-힣]+)\s*(\d+)?\s*vs\s*(\d+)?\s*([A-Za-z가-힣]+)").expect("valid regex")
});
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[01]?\d|2[0-3]):[0-5]\d\b").expect("valid regex"));
static STADIUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"구장|잠실|고척|문학|사직|수원|창원|대전|광주|대구|울산|춘천|원주|포항|경기장").expect("valid regex")
});
static STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)예정|경기중|종료|취소|우천|콜드").expect("valid regex"));
static BROADCAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}-[A-Z0-9]+").expect("valid regex"));
/// `3 : 2`, `3-2` between whitespace. Only consulted after times are removed.
static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(\d{1,2})\s*[:\-]\s*(\d{1,2})(?:\s|$)").expect("valid regex")
});

pub const TEAM_TOKENS: &[&str] = &[
    "LG", "KIA", "SSG", "NC", "KT", "두산", "롯데", "삼성", "한화", "키움", "Doosan", "Lotte",
    "Samsung", "Hanwha", "Kiwoom",
];

static TEAM_TOKEN_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TEAM_TOKENS
        .iter()
        .map(|t| {
            let re = Regex::new(&format!(r"(?:^|\s)({})(?:\s|$)", regex::escape(t))).expect("valid regex");
            (*t, re)
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub away: String,
    pub home: String,
    pub away_score: Option<u32>,
    pub home_score: Option<u32>,
}

/// `A [n] vs [m] B`, case-insensitive.
pub fn matchup_vs(text: &str) -> Option<Matchup> {
    let caps = VS.captures(text)?;
    Some(Matchup {
        away: caps[1].to_string(),
        home: caps[4].to_string(),
        away_score: caps.get(2).map(|m| norm_count(m.as_str())),
        home_score: caps.get(3).map(|m| norm_count(m.as_str())),
    })
}

/// First two distinct known team tokens by position; the earlier one is away.
pub fn matchup_tokens(text: &str) -> Option<Matchup> {
    let mut found: Vec<(usize, &str)> = TEAM_TOKEN_RES
        .iter()
        .filter_map(|(token, re)| re.captures(text).and_then(|c| c.get(1)).map(|m| (m.start(), *token)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    match found.as_slice() {
        [(_, away), (_, home), ..] => Some(Matchup {
            away: away.to_string(),
            home: home.to_string(),
            away_score: None,
            home_score: None,
        }),
        _ => None,
    }
}

pub fn find_time(text: &str) -> Option<String> {
    TIME.find(text).map(|m| m.as_str().to_string())
}

/// `3:2` style score in `text`, ignoring anything that is a clock time.
pub fn find_score(text: &str) -> Option<(u32, u32)> {
    let without_times = TIME.replace_all(text, " ");
    let caps = SCORE.captures(&without_times)?;
    Some((norm_count(&caps[1]), norm_count(&caps[2])))
}

/// Fill stadium, status, broadcasts and time from the first value matching each.
pub fn pick_details<S: AsRef<str>>(values: &[S], game: &mut ScheduleGame) {
    for v in values {
        let v: &str = v.as_ref();
        if game.stadium.is_none() && STADIUM.is_match(v) {
            game.stadium = Some(v.to_string());
        }
        if game.status.is_none() && STATUS.is_match(v) {
            game.status = Some(v.to_string());
        }
        if game.broadcasts.is_none() && BROADCAST.is_match(v) {
            game.broadcasts = Some(broadcast_tokens(v));
        }
        if game.time.is_none() {
            game.time = find_time(v);
        }
    }
}

pub fn is_broadcast_list(s: &str) -> bool {
    BROADCAST.is_match(s)
}

pub fn broadcast_tokens(s: &str) -> Vec<String> {
    s.split_whitespace()
        .filter(|t| BROADCAST.is_match(t))
        .map(str::to_string)
        .collect()
}

pub fn is_stadium(s: &str) -> bool {
    STADIUM.is_match(s)
}

impl Matchup {
    pub fn apply(self, game: &mut ScheduleGame) {
        game.away_team = self.away;
        game.home_team = self.home;
        game.away_score = self.away_score;
        game.home_score = self.home_score;
    }
}
