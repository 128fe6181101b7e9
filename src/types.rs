use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Team tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRanking {
    pub rank: u32,
    pub team: String,
    pub logo: String,
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    /// Games behind the leader.
    pub game_diff: f64,
    pub streak: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOffense {
    pub rank: u32,
    pub team: String,
    pub logo: String,
    pub avg: f64,
    pub runs: u32,
    pub rbi: u32,
    pub hr: u32,
    pub bb: u32,
    pub so: u32,
    pub doubles: u32,
    pub triples: u32,
    pub sb: u32,
    pub hbp: u32,
    pub errors: u32,
    pub dp: u32,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDefense {
    pub rank: u32,
    pub team: String,
    pub logo: String,
    pub era: f64,
    pub runs: u32,
    pub er: u32,
    /// Kept verbatim: "165.2" means 165 and two thirds innings.
    pub innings: String,
    pub hits: u32,
    pub hr: u32,
    pub so: u32,
    pub bb: u32,
    pub holds: u32,
    pub errors: u32,
    pub whip: f64,
    pub qs: u32,
    pub saves: u32,
}

/// Anything keyed by rank within one response.
pub trait Ranked {
    fn rank(&self) -> u32;
    fn team(&self) -> &str;
}

macro_rules! impl_ranked {
    ($($t:ty),*) => {
        $(impl Ranked for $t {
            fn rank(&self) -> u32 {
                self.rank
            }
            fn team(&self) -> &str {
                &self.team
            }
        })*
    };
}

impl_ranked!(TeamRanking, TeamOffense, TeamDefense);

/// Keep the first row seen per rank, drop rank 0 / nameless rows, sort ascending, cap.
pub fn rank_dedup_sort<T: Ranked>(items: Vec<T>, cap: usize) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<T> = items
        .into_iter()
        .filter(|r| r.rank() > 0 && !r.team().is_empty())
        .filter(|r| seen.insert(r.rank()))
        .collect();
    out.sort_by_key(|r| r.rank());
    out.truncate(cap);
    out
}

// ---------------------------------------------------------------------------
// Month-end rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRank {
    pub month: String,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRankSeries {
    pub team: String,
    pub data: Vec<MonthRank>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthEndRankings {
    pub months: Vec<String>,
    pub series: Vec<TeamRankSeries>,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    /// YYYY-MM-DD, present when the row's day could be attributed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stadium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcasts: Option<Vec<String>>,
    /// Upstream wording (예정, 경기중, 종료, 취소, 우천취소 …), matched by keyword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
}

// ---------------------------------------------------------------------------
// Top players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayerType {
    Hitter,
    Pitcher,
}

impl PlayerType {
    /// Case-insensitive `HITTER` / `PITCHER`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HITTER" => Some(PlayerType::Hitter),
            "PITCHER" => Some(PlayerType::Pitcher),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlayerType::Hitter => "HITTER",
            PlayerType::Pitcher => "PITCHER",
        };
        write!(f, "{s}")
    }
}

/// A leaderboard value already shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Fixed-precision rate ("0.345", "2.41").
    Text(String),
    /// Counting stat.
    Int(i64),
    /// Unrounded decimal (WAR).
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPlayerEntry {
    pub rank: u32,
    pub name: String,
    pub team: String,
    pub value: MetricValue,
}

// ---------------------------------------------------------------------------
// HTML table classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Rankings,
    Offense,
    Defense,
    Schedule,
}

impl TableKind {
    /// Rows with fewer cells than this are skipped as malformed.
    pub fn min_cells(self) -> usize {
        match self {
            TableKind::Schedule => 1,
            _ => crate::config::MIN_TEAM_ROW_CELLS,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TableKind::Rankings => "rankings",
            TableKind::Offense => "offense",
            TableKind::Defense => "defense",
            TableKind::Schedule => "schedule",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(rank: u32, team: &str) -> TeamRanking {
        TeamRanking {
            rank,
            team: team.to_string(),
            logo: String::new(),
            games: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            win_rate: 0.0,
            game_diff: 0.0,
            streak: String::new(),
        }
    }

    #[test]
    fn dedup_keeps_first_per_rank_and_sorts() {
        let rows = vec![ranking(2, "KT"), ranking(1, "LG"), ranking(2, "NC"), ranking(0, "SSG"), ranking(3, "")];
        let out = rank_dedup_sort(rows, 10);
        let teams: Vec<_> = out.iter().map(|r| (r.rank, r.team.as_str())).collect();
        assert_eq!(teams, vec![(1, "LG"), (2, "KT")]);
    }

    #[test]
    fn dedup_truncates_to_cap() {
        let rows = (1..=15).map(|r| ranking(r, "T")).collect();
        assert_eq!(rank_dedup_sort(rows, 10).len(), 10);
    }

    #[test]
    fn player_type_parse() {
        assert_eq!(PlayerType::parse("hitter"), Some(PlayerType::Hitter));
        assert_eq!(PlayerType::parse("PITCHER"), Some(PlayerType::Pitcher));
        assert_eq!(PlayerType::parse("catcher"), None);
    }

    #[test]
    fn metric_value_serializes_flat() {
        let e = TopPlayerEntry { rank: 1, name: "A".into(), team: "LG".into(), value: MetricValue::Text("0.345".into()) };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["value"], "0.345");
        let e = TopPlayerEntry { value: MetricValue::Int(38), ..e };
        assert_eq!(serde_json::to_value(&e).unwrap()["value"], 38);
    }

    #[test]
    fn schedule_game_omits_missing_fields() {
        let g = ScheduleGame { home_team: "LG".into(), away_team: "KT".into(), ..Default::default() };
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(v["homeTeam"], "LG");
        assert!(v.get("homeScore").is_none());
        assert!(v.get("date").is_none());
    }
}
