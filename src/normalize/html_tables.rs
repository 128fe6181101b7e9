//! Scraped table rows → typed team records.
//!
//! Columns are found by anchored header keywords. When a rate column's header is
//! missing (mobile and desktop variants label them differently) the n-th cell that
//! looks like that kind of rate is used instead. Counting stats without a header are 0.
//! The season JSON feed is the accurate path; this one is best-effort.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::TEAM_TABLE_CAP;
use crate::extract::ExtractedTable;
use crate::normalize::fields::{logo_or_static, norm_count, norm_num, resolve_url, round_to};
use crate::types::{rank_dedup_sort, TeamDefense, TeamOffense, TeamRanking};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Rank,
    Team,
    Games,
    Wins,
    Draws,
    Losses,
    WinRate,
    GameDiff,
    Streak,
    Avg,
    Runs,
    Rbi,
    Hr,
    Bb,
    So,
    Doubles,
    Triples,
    Sb,
    Hbp,
    Errors,
    Dp,
    Obp,
    Slg,
    Ops,
    Era,
    RunsAllowed,
    EarnedRuns,
    Innings,
    HitsAllowed,
    HrAllowed,
    Strikeouts,
    Walks,
    Holds,
    Qs,
    Saves,
    Whip,
}

const COLUMN_PATTERNS: &[(Column, &str)] = &[
    (Column::Rank, r"순위|순|rank"),
    (Column::Team, r"팀|팀명|구단|team"),
    (Column::Games, r"경기|경기수|g|gp"),
    (Column::Wins, r"승|w"),
    (Column::Draws, r"무|d|t"),
    (Column::Losses, r"패|l"),
    (Column::WinRate, r"승률|win\s*rate|pct|wpct"),
    (Column::GameDiff, r"게임차|승차|gb"),
    (Column::Streak, r"연속|연승/연패|strk|streak"),
    (Column::Avg, r"타율|avg"),
    (Column::Runs, r"득점|r"),
    (Column::Rbi, r"타점|rbi"),
    (Column::Hr, r"홈런|hr"),
    (Column::Bb, r"볼넷|bb"),
    (Column::So, r"삼진|so|k"),
    (Column::Doubles, r"2루타|2b"),
    (Column::Triples, r"3루타|3b"),
    (Column::Sb, r"도루|sb"),
    (Column::Hbp, r"사구|몸에\s*맞는\s*볼|hbp"),
    (Column::Errors, r"실책|e"),
    (Column::Dp, r"병살|병살타|gdp|dp"),
    (Column::Obp, r"출루율|obp"),
    (Column::Slg, r"장타율|slg"),
    (Column::Ops, r"ops|출루\+장타"),
    (Column::Era, r"era|평균자책|평균자책점"),
    (Column::RunsAllowed, r"실점|r"),
    (Column::EarnedRuns, r"자책|자책점|er"),
    (Column::Innings, r"이닝|ip"),
    (Column::HitsAllowed, r"피안타|h"),
    (Column::HrAllowed, r"피홈런|hr"),
    (Column::Strikeouts, r"탈삼진|삼진|so|k"),
    (Column::Walks, r"볼넷|사사구|bb"),
    (Column::Holds, r"홀드|hld|hd"),
    (Column::Qs, r"qs"),
    (Column::Saves, r"세이브|sv"),
    (Column::Whip, r"whip"),
];

static COLUMNS: LazyLock<HashMap<Column, Regex>> = LazyLock::new(|| {
    COLUMN_PATTERNS
        .iter()
        .map(|(col, p)| {
            let re = Regex::new(&format!(r"(?i)^(?:{p})$")).expect("valid column pattern");
            (*col, re)
        })
        .collect()
});

/// `0.345`, `.345`: batting-style rates.
static BATTING_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0?\.\d{2,3}$").expect("valid regex"));
/// `3.55`, `12.00`: ERA/WHIP-style rates.
static PITCHING_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}\.\d{2}$").expect("valid regex"));
/// Win percentage between 0 and 1 with up to three decimals.
static WIN_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0?\.\d{1,3}|1\.0{1,3}|0|1)$").expect("valid regex"));

/// One data row read against its table's headers.
struct RowView<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> RowView<'a> {
    fn index(&self, col: Column) -> Option<usize> {
        let re = COLUMNS.get(&col)?;
        self.headers.iter().position(|h| re.is_match(h))
    }

    /// Cell under `col`'s header, if the header exists and the cell isn't blank.
    fn cell(&self, col: Column) -> Option<&'a str> {
        let idx = self.index(col)?;
        self.cells
            .get(idx)
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }

    /// Header lookup, else the cell at `pos`.
    fn cell_or(&self, col: Column, pos: usize) -> &'a str {
        self.cell(col)
            .or_else(|| self.cells.get(pos).map(String::as_str))
            .unwrap_or("")
    }

    fn count(&self, col: Column) -> u32 {
        self.cell(col).map(norm_count).unwrap_or(0)
    }

    /// Header lookup, else the `nth` cell shaped like `shape`.
    fn rate(&self, col: Column, shape: &Regex, nth: usize) -> f64 {
        if let Some(c) = self.cell(col) {
            return norm_num(c);
        }
        self.cells
            .iter()
            .filter(|c| shape.is_match(c.trim()))
            .nth(nth)
            .map(|c| norm_num(c))
            .unwrap_or(0.0)
    }
}

fn rows_of(tables: &[ExtractedTable]) -> impl Iterator<Item = (RowView<'_>, Option<&str>)> {
    tables.iter().flat_map(|t| {
        t.rows.iter().map(move |r| {
            (
                RowView { headers: &t.headers, cells: &r.cells },
                r.logo.as_deref(),
            )
        })
    })
}

fn team_logo(raw: Option<&str>, team: &str, base: &str) -> String {
    logo_or_static(raw.map(|src| resolve_url(src, base)).unwrap_or_default(), team)
}

pub fn normalize_rankings(tables: &[ExtractedTable], logo_base: &str) -> Vec<TeamRanking> {
    let rows = rows_of(tables)
        .map(|(row, logo)| {
            let team = row.cell_or(Column::Team, 1).to_string();
            let win_rate = match row.cell(Column::WinRate) {
                Some(c) => norm_num(c),
                None => row
                    .cells
                    .iter()
                    .find(|c| WIN_RATE.is_match(c.trim()) && c.contains('.'))
                    .map(|c| norm_num(c))
                    .unwrap_or(0.0),
            };
            TeamRanking {
                rank: norm_count(row.cell_or(Column::Rank, 0)),
                logo: team_logo(logo, &team, logo_base),
                games: norm_count(row.cell_or(Column::Games, 2)),
                wins: norm_count(row.cell_or(Column::Wins, 3)),
                draws: norm_count(row.cell_or(Column::Draws, 4)),
                losses: norm_count(row.cell_or(Column::Losses, 5)),
                win_rate: win_rate.clamp(0.0, 1.0),
                game_diff: row.cell(Column::GameDiff).map(norm_num).unwrap_or(0.0).max(0.0),
                streak: row.cell(Column::Streak).unwrap_or("").to_string(),
                team,
            }
        })
        .collect();
    rank_dedup_sort(rows, TEAM_TABLE_CAP)
}

pub fn normalize_offense(tables: &[ExtractedTable], logo_base: &str) -> Vec<TeamOffense> {
    let rows = rows_of(tables)
        .map(|(row, logo)| {
            let team = row.cell_or(Column::Team, 1).to_string();
            let obp = row.rate(Column::Obp, &BATTING_RATE, 1);
            let slg = row.rate(Column::Slg, &BATTING_RATE, 2);
            let ops = match row.cell(Column::Ops) {
                Some(c) => norm_num(c),
                None => round_to(obp + slg, 3),
            };
            TeamOffense {
                rank: norm_count(row.cell_or(Column::Rank, 0)),
                logo: team_logo(logo, &team, logo_base),
                avg: row.rate(Column::Avg, &BATTING_RATE, 0),
                runs: row.count(Column::Runs),
                rbi: row.count(Column::Rbi),
                hr: row.count(Column::Hr),
                bb: row.count(Column::Bb),
                so: row.count(Column::So),
                doubles: row.count(Column::Doubles),
                triples: row.count(Column::Triples),
                sb: row.count(Column::Sb),
                hbp: row.count(Column::Hbp),
                errors: row.count(Column::Errors),
                dp: row.count(Column::Dp),
                obp,
                slg,
                ops,
                team,
            }
        })
        .collect();
    rank_dedup_sort(rows, TEAM_TABLE_CAP)
}

pub fn normalize_defense(tables: &[ExtractedTable], logo_base: &str) -> Vec<TeamDefense> {
    let rows = rows_of(tables)
        .map(|(row, logo)| {
            let team = row.cell_or(Column::Team, 1).to_string();
            TeamDefense {
                rank: norm_count(row.cell_or(Column::Rank, 0)),
                logo: team_logo(logo, &team, logo_base),
                era: row.rate(Column::Era, &PITCHING_RATE, 0),
                runs: row.count(Column::RunsAllowed),
                er: row.count(Column::EarnedRuns),
                innings: row.cell(Column::Innings).unwrap_or("").trim().to_string(),
                hits: row.count(Column::HitsAllowed),
                hr: row.count(Column::HrAllowed),
                so: row.count(Column::Strikeouts),
                bb: row.count(Column::Walks),
                holds: row.count(Column::Holds),
                errors: row.count(Column::Errors),
                whip: row.rate(Column::Whip, &PITCHING_RATE, 1),
                qs: row.count(Column::Qs),
                saves: row.count(Column::Saves),
                team,
            }
        })
        .collect();
    rank_dedup_sort(rows, TEAM_TABLE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NAVER_MOBILE_URL;
    use crate::extract::fixtures::{DEFENSE_HTML, OFFENSE_HTML, RANKINGS_HTML};
    use crate::extract::{extract_tables, ExtractedRow};
    use crate::types::TableKind;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ExtractedTable {
        ExtractedTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| ExtractedRow { cells: r.iter().map(|s| s.to_string()).collect(), logo: None })
                .collect(),
        }
    }

    #[test]
    fn rankings_fixture_round_trip() {
        let tables = extract_tables(RANKINGS_HTML, TableKind::Rankings);
        let ranks = normalize_rankings(&tables, NAVER_MOBILE_URL);
        assert_eq!(ranks.len(), 10);
        assert!(ranks.iter().all(|r| (0.0..=1.0).contains(&r.win_rate)));
        assert!(ranks.windows(2).all(|w| w[0].rank < w[1].rank));

        let lg = &ranks[0];
        assert_eq!((lg.rank, lg.team.as_str()), (1, "LG"));
        assert_eq!((lg.games, lg.wins, lg.draws, lg.losses), (132, 80, 2, 50));
        assert_eq!(lg.win_rate, 0.615);
        assert_eq!(lg.game_diff, 0.0);
        assert_eq!(lg.streak, "2승");
        assert_eq!(lg.logo, "https://img.example/lg.png");

        assert_eq!(ranks[1].logo, "https://m.sports.naver.com/emblem/hanwha.png");
        // No <img>: static table.
        assert_eq!(ranks[2].logo, "/logos/ssg.png");
        assert_eq!(ranks[9].game_diff, 33.0);
    }

    #[test]
    fn normalizing_is_idempotent() {
        let tables = extract_tables(RANKINGS_HTML, TableKind::Rankings);
        assert_eq!(normalize_rankings(&tables, NAVER_MOBILE_URL), normalize_rankings(&tables, NAVER_MOBILE_URL));
    }

    #[test]
    fn win_rate_fallback_ignores_rank_digits() {
        // No 승률 header: the rank "1" must not be mistaken for a 1.000 win rate.
        let t = table(
            &["순위", "팀", "경기", "승", "무", "패", "PCT%"],
            &[&["1", "LG", "132", "80", "2", "50", "0.615"]],
        );
        let ranks = normalize_rankings(&[t], NAVER_MOBILE_URL);
        assert_eq!(ranks[0].win_rate, 0.615);
    }

    #[test]
    fn offense_by_header() {
        let tables = extract_tables(OFFENSE_HTML, TableKind::Offense);
        let off = normalize_offense(&tables, NAVER_MOBILE_URL);
        // Duplicate rank 2 row collapses.
        assert_eq!(off.len(), 2);
        let lg = &off[0];
        assert_eq!(lg.avg, 0.278);
        assert_eq!((lg.runs, lg.rbi, lg.hr, lg.bb, lg.so, lg.sb), (700, 668, 110, 520, 900, 101));
        assert_eq!((lg.obp, lg.slg, lg.ops), (0.361, 0.409, 0.770));
        assert_eq!(lg.doubles, 0);
        assert_eq!(lg.logo, "/logos/lg.png");
    }

    #[test]
    fn offense_rate_fallback_and_ops_sum() {
        let t = table(
            &["순위", "팀", "Batting", "On-base", "Slugging", "HR"],
            &[&["1", "KT", ".281", "0.350", "0.420", "99"]],
        );
        let off = normalize_offense(&[t], NAVER_MOBILE_URL);
        assert_eq!(off[0].avg, 0.281);
        assert_eq!(off[0].obp, 0.350);
        assert_eq!(off[0].slg, 0.420);
        assert_eq!(off[0].ops, 0.770);
        assert_eq!(off[0].hr, 99);
    }

    #[test]
    fn defense_by_header() {
        let tables = extract_tables(DEFENSE_HTML, TableKind::Defense);
        let def = normalize_defense(&tables, NAVER_MOBILE_URL);
        assert_eq!(def.len(), 2);
        let hh = &def[0];
        assert_eq!(hh.team, "한화");
        assert_eq!(hh.era, 3.55);
        assert_eq!(hh.whip, 1.29);
        assert_eq!(hh.innings, "1165.2");
        assert_eq!((hh.runs, hh.er, hh.hits, hh.hr, hh.so, hh.bb), (540, 480, 1100, 90, 1150, 400));
        assert_eq!((hh.holds, hh.saves, hh.qs), (80, 40, 0));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(normalize_rankings(&[], NAVER_MOBILE_URL).is_empty());
        assert!(normalize_offense(&[], NAVER_MOBILE_URL).is_empty());
        assert!(normalize_defense(&[], NAVER_MOBILE_URL).is_empty());
    }
}
