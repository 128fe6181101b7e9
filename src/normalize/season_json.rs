//! Season team-stats JSON feed → team records.
//!
//! One feed carries standings, offense and defense for every team; each adapter
//! reads the slice of fields it needs.

use serde::Deserialize;

use crate::config::TEAM_TABLE_CAP;
use crate::normalize::fields::{f64_to_count, logo_or_static, resolve_url};
use crate::normalize::loose::{opt_f64, opt_string};
use crate::types::{rank_dedup_sort, TeamDefense, TeamOffense, TeamRanking};

/// `{ code, success, result: { seasonTeamStats: [...] } }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub result: Option<SeasonResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonResult {
    #[serde(default)]
    pub season_team_stats: Vec<SeasonTeam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonTeam {
    #[serde(default, deserialize_with = "opt_string")]
    pub team_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub team_image_url: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub ranking: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub wra: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub game_behind: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub game_count: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub win_game_count: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub drawn_game_count: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub lose_game_count: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub continuous_game_result: Option<String>,

    // offense
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_hra: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_run: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_rbi: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_hr: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_h2: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_h3: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_sb: Option<f64>,
    /// Walks plus hit-by-pitch; the feed doesn't split them.
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_bbhp: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_kk: Option<f64>,
    /// Grounded into double play.
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_gd: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_obp: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_slg: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub offense_ops: Option<f64>,

    // defense
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_era: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_r: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_er: Option<f64>,
    /// Arrives as a number (`1156.1`) or a string; kept as text.
    #[serde(default, deserialize_with = "opt_string")]
    pub defense_inning: Option<String>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_hit: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_hr: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_kk: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_bbhp: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_err: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_whip: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_qs: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_save: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub defense_hold: Option<f64>,
}

impl SeasonResponse {
    pub fn teams(&self) -> &[SeasonTeam] {
        self.result
            .as_ref()
            .map(|r| r.season_team_stats.as_slice())
            .unwrap_or(&[])
    }
}

fn count(v: Option<f64>) -> u32 {
    v.map(f64_to_count).unwrap_or(0)
}

fn rate(v: Option<f64>) -> f64 {
    v.unwrap_or(0.0)
}

impl SeasonTeam {
    fn rank(&self) -> u32 {
        count(self.ranking)
    }

    /// Display name, falling back to the team id.
    fn name(&self) -> String {
        self.team_name
            .clone()
            .or_else(|| self.team_id.clone())
            .unwrap_or_default()
    }

    fn logo(&self, team: &str, base: &str) -> String {
        let raw = self
            .team_image_url
            .as_deref()
            .map(|src| resolve_url(src, base))
            .unwrap_or_default();
        logo_or_static(raw, team)
    }
}

pub fn adapt_rankings(resp: &SeasonResponse, logo_base: &str) -> Vec<TeamRanking> {
    let rows = resp
        .teams()
        .iter()
        .map(|t| {
            let team = t.name();
            TeamRanking {
                rank: t.rank(),
                logo: t.logo(&team, logo_base),
                games: count(t.game_count),
                wins: count(t.win_game_count),
                draws: count(t.drawn_game_count),
                losses: count(t.lose_game_count),
                win_rate: rate(t.wra).clamp(0.0, 1.0),
                game_diff: rate(t.game_behind),
                streak: t.continuous_game_result.clone().unwrap_or_default(),
                team,
            }
        })
        .collect();
    rank_dedup_sort(rows, TEAM_TABLE_CAP)
}

pub fn adapt_offense(resp: &SeasonResponse, logo_base: &str) -> Vec<TeamOffense> {
    let rows = resp
        .teams()
        .iter()
        .map(|t| {
            let team = t.name();
            TeamOffense {
                rank: t.rank(),
                logo: t.logo(&team, logo_base),
                avg: rate(t.offense_hra),
                runs: count(t.offense_run),
                rbi: count(t.offense_rbi),
                hr: count(t.offense_hr),
                bb: count(t.offense_bbhp),
                so: count(t.offense_kk),
                doubles: count(t.offense_h2),
                triples: count(t.offense_h3),
                sb: count(t.offense_sb),
                hbp: 0,
                errors: 0,
                dp: count(t.offense_gd),
                obp: rate(t.offense_obp),
                slg: rate(t.offense_slg),
                ops: rate(t.offense_ops),
                team,
            }
        })
        .collect();
    rank_dedup_sort(rows, TEAM_TABLE_CAP)
}

pub fn adapt_defense(resp: &SeasonResponse, logo_base: &str) -> Vec<TeamDefense> {
    let rows = resp
        .teams()
        .iter()
        .map(|t| {
            let team = t.name();
            TeamDefense {
                rank: t.rank(),
                logo: t.logo(&team, logo_base),
                era: rate(t.defense_era),
                runs: count(t.defense_r),
                er: count(t.defense_er),
                innings: t.defense_inning.clone().unwrap_or_default(),
                hits: count(t.defense_hit),
                hr: count(t.defense_hr),
                so: count(t.defense_kk),
                bb: count(t.defense_bbhp),
                holds: count(t.defense_hold),
                errors: count(t.defense_err),
                whip: rate(t.defense_whip),
                qs: count(t.defense_qs),
                saves: count(t.defense_save),
                team,
            }
        })
        .collect();
    rank_dedup_sort(rows, TEAM_TABLE_CAP)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two teams, listed out of order, one with string-typed numbers.
    pub const SEASON_JSON: &str = r#"{
      "code": 200,
      "success": true,
      "result": {
        "seasonTeamStats": [
          {
            "teamId": "HH", "teamName": "한화", "ranking": "2",
            "wra": "0.594", "gameBehind": 3.0, "gameCount": 131,
            "winGameCount": 76, "drawnGameCount": 3, "loseGameCount": 52,
            "continuousGameResult": "1패",
            "offenseHra": 0.266, "offenseRun": 650, "offenseHr": 100,
            "defenseEra": 3.55, "defenseInning": "1165.2", "defenseWhip": 1.29
          },
          {
            "teamId": "LG", "teamName": "LG", "teamImageUrl": "https://img.example/lg.png",
            "ranking": 1, "wra": 0.615, "gameBehind": 0, "gameCount": 132,
            "winGameCount": 80, "drawnGameCount": 2, "loseGameCount": 50,
            "continuousGameResult": "2승",
            "offenseHra": 0.278, "offenseRun": 700, "offenseRbi": 668, "offenseHr": 110,
            "offenseH2": 230, "offenseH3": 20, "offenseSb": 101, "offenseBbhp": 560,
            "offenseKk": 900, "offenseGd": 95, "offenseObp": 0.361, "offenseSlg": 0.409,
            "offenseOps": 0.770,
            "defenseEra": 3.80, "defenseR": 570, "defenseEr": 510, "defenseInning": 1156.1,
            "defenseHit": 1120, "defenseHr": 100, "defenseKk": 1000, "defenseBbhp": 450,
            "defenseErr": 85, "defenseWhip": 1.33, "defenseQs": 60, "defenseSave": 35,
            "defenseHold": 70
          },
          { "teamId": "XX", "ranking": 0 }
        ]
      }
    }"#;
}
