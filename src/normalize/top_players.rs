//! Leaderboard payloads → per-category top-20 lists.
//!
//! The API has shipped two shapes: the current grouped one
//! (`result.topPlayers[{type, rankings}]`) and an older flat player list with
//! per-player stat fields under several aliases. The payload is narrowed once
//! into [`TopPlayersPayload`] and each variant gets its own adapter.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::config::LEADERBOARD_CAP;
use crate::normalize::loose::{value_f64, value_string};
use crate::types::{MetricValue, PlayerType, TopPlayerEntry};

pub type TopCategories = BTreeMap<String, Vec<TopPlayerEntry>>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    /// Fixed decimal places, rendered as text.
    Fixed(usize),
    Int,
    Float,
}

struct Category {
    player_type: PlayerType,
    /// Group `type` in the grouped shape; also the value field of each ranking.
    upstream: &'static str,
    key: &'static str,
    format: Format,
    ascending: bool,
    /// Field names tried in order in the flat shape.
    flat_aliases: &'static [&'static str],
}

const CATEGORIES: &[Category] = &[
    Category { player_type: PlayerType::Pitcher, upstream: "pitcherEra", key: "era", format: Format::Fixed(2), ascending: true, flat_aliases: &["era", "pitcherEra"] },
    Category { player_type: PlayerType::Pitcher, upstream: "pitcherWin", key: "wins", format: Format::Int, ascending: false, flat_aliases: &["w", "pitcherWin"] },
    Category { player_type: PlayerType::Pitcher, upstream: "pitcherKk", key: "strikeouts", format: Format::Int, ascending: false, flat_aliases: &["so", "kk", "pitcherKk"] },
    Category { player_type: PlayerType::Pitcher, upstream: "pitcherSave", key: "saves", format: Format::Int, ascending: false, flat_aliases: &["sv", "pitcherSave"] },
    Category { player_type: PlayerType::Pitcher, upstream: "pitcherWhip", key: "whip", format: Format::Fixed(2), ascending: true, flat_aliases: &["whip", "pitcherWhip"] },
    Category { player_type: PlayerType::Pitcher, upstream: "pitcherWar", key: "war", format: Format::Float, ascending: false, flat_aliases: &["war", "hitterWar", "pitcherWar"] },
    Category { player_type: PlayerType::Hitter, upstream: "hitterHra", key: "average", format: Format::Fixed(3), ascending: false, flat_aliases: &["avg", "hra", "hitterHra"] },
    Category { player_type: PlayerType::Hitter, upstream: "hitterHr", key: "homeruns", format: Format::Int, ascending: false, flat_aliases: &["hr", "hitterHr"] },
    Category { player_type: PlayerType::Hitter, upstream: "hitterRbi", key: "rbis", format: Format::Int, ascending: false, flat_aliases: &["rbi", "hitterRbi"] },
    Category { player_type: PlayerType::Hitter, upstream: "hitterSb", key: "steals", format: Format::Int, ascending: false, flat_aliases: &["sb", "hitterSb"] },
    Category { player_type: PlayerType::Hitter, upstream: "hitterOps", key: "ops", format: Format::Fixed(3), ascending: false, flat_aliases: &["ops", "hitterOps"] },
    Category { player_type: PlayerType::Hitter, upstream: "hitterWar", key: "war", format: Format::Float, ascending: false, flat_aliases: &["war", "hitterWar", "pitcherWar"] },
];

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RankingGroup {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub rankings: Vec<Value>,
}

#[derive(Debug, Clone)]
pub enum TopPlayersPayload {
    Grouped(Vec<RankingGroup>),
    Flat(Vec<Value>),
}

impl TopPlayersPayload {
    /// Narrow a raw response. Unrecognised shapes become an empty flat list.
    pub fn from_value(json: &Value) -> Self {
        let result = json.get("result").filter(|v| !v.is_null()).unwrap_or(json);

        if let Some(groups) = result.get("topPlayers").and_then(Value::as_array) {
            let groups = groups
                .iter()
                .filter_map(|g| RankingGroup::deserialize(g).ok())
                .collect();
            return TopPlayersPayload::Grouped(groups);
        }

        let players = ["players", "items", "list"]
            .iter()
            .find_map(|k| result.get(*k).and_then(Value::as_array))
            .or_else(|| json.get("players").and_then(Value::as_array))
            .cloned()
            .unwrap_or_default();
        TopPlayersPayload::Flat(players)
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

struct Candidate {
    name: String,
    team: String,
    value: Option<f64>,
    raw: Value,
}

fn player_name(p: &Value) -> String {
    p.get("playerName").and_then(value_string).unwrap_or_default()
}

fn player_team(p: &Value) -> String {
    ["teamName", "teamShortName", "teamId"]
        .iter()
        .find_map(|k| p.get(*k).and_then(value_string))
        .unwrap_or_default()
}

/// Stable sort by metric. Players without the metric sink below everyone who has it.
fn sort_candidates(list: &mut [Candidate], ascending: bool) {
    list.sort_by(|a, b| match (a.value, b.value) {
        (Some(x), Some(y)) => {
            if ascending {
                x.total_cmp(&y)
            } else {
                y.total_cmp(&x)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn format_value(c: &Candidate, format: Format) -> MetricValue {
    match (c.value, format) {
        (Some(v), Format::Fixed(digits)) => MetricValue::Text(format!("{v:.digits$}")),
        (Some(v), Format::Int) if v.fract() == 0.0 => MetricValue::Int(v as i64),
        (Some(v), _) => MetricValue::Float(v),
        (None, _) => match value_string(&c.raw) {
            Some(s) => MetricValue::Text(s),
            None => MetricValue::Text("-".to_string()),
        },
    }
}

fn finish(mut list: Vec<Candidate>, cat: &Category) -> Vec<TopPlayerEntry> {
    sort_candidates(&mut list, cat.ascending);
    list.truncate(LEADERBOARD_CAP);
    list.iter()
        .enumerate()
        .map(|(i, c)| TopPlayerEntry {
            rank: i as u32 + 1,
            name: c.name.clone(),
            team: c.team.clone(),
            value: format_value(c, cat.format),
        })
        .collect()
}

fn adapt_grouped(player_type: PlayerType, groups: &[RankingGroup]) -> TopCategories {
    let mut out = TopCategories::new();
    for group in groups {
        let Some(cat) = CATEGORIES
            .iter()
            .find(|c| c.upstream == group.kind && c.player_type == player_type)
        else {
            continue;
        };

        let list: Vec<Candidate> = group
            .rankings
            .iter()
            .map(|p| {
                let raw = p.get(cat.upstream).cloned().unwrap_or(Value::Null);
                Candidate {
                    name: player_name(p),
                    team: player_team(p),
                    value: value_f64(&raw),
                    raw,
                }
            })
            .filter(|c| !c.name.is_empty())
            .collect();
        if list.is_empty() {
            continue;
        }
        out.insert(cat.key.to_string(), finish(list, cat));
    }
    out
}

fn flat_value(p: &Value, cat: &Category) -> f64 {
    let aliased = cat.flat_aliases.iter().find_map(|k| p.get(*k).filter(|v| !v.is_null()));
    match aliased {
        Some(v) => value_f64(v).unwrap_or(0.0),
        None if cat.key == "ops" => {
            let part = |k: &str| p.get(k).and_then(value_f64).unwrap_or(0.0);
            part("obp") + part("slg")
        }
        None => 0.0,
    }
}

fn adapt_flat(player_type: PlayerType, players: &[Value]) -> TopCategories {
    let named: Vec<&Value> = players.iter().filter(|p| !player_name(p).is_empty()).collect();

    CATEGORIES
        .iter()
        .filter(|c| c.player_type == player_type)
        .map(|cat| {
            let list = named
                .iter()
                .map(|p| Candidate {
                    name: player_name(p),
                    team: player_team(p),
                    value: Some(flat_value(p, cat)),
                    raw: Value::Null,
                })
                .collect();
            (cat.key.to_string(), finish(list, cat))
        })
        .collect()
}

pub fn adapt_top_players(player_type: PlayerType, payload: &TopPlayersPayload) -> TopCategories {
    match payload {
        TopPlayersPayload::Grouped(groups) => adapt_grouped(player_type, groups),
        TopPlayersPayload::Flat(players) => adapt_flat(player_type, players),
    }
}
