//! Header-keyword rules deciding which `<table>` holds which data.
//!
//! Each rule is a conjunction of keyword groups: a table matches only when every
//! group hits at least one header cell. Rules are tried in order and the first full
//! match classifies the table, so a more specific kind listed earlier wins over a
//! looser one later. Adding a table kind means adding rows here, nothing else.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::TableKind;

pub struct TableRule {
    pub kind: TableKind,
    /// Case-insensitive patterns; all must match some header.
    pub required: &'static [&'static str],
}

pub const TABLE_RULES: &[TableRule] = &[
    TableRule {
        kind: TableKind::Defense,
        required: &[r"ERA|평균자책", r"WHIP"],
    },
    TableRule {
        kind: TableKind::Offense,
        required: &[r"타율|AVG", r"OPS|출루\+장타|장타율|SLG|출루율|OBP"],
    },
    TableRule {
        kind: TableKind::Rankings,
        required: &[r"순위|순|rank", r"승률|win\s*rate|승"],
    },
    TableRule {
        kind: TableKind::Schedule,
        required: &[r"경기|매치|match"],
    },
    TableRule {
        kind: TableKind::Schedule,
        required: &[r"시간|시각|time", r"구장|경기장|stadium"],
    },
];

struct CompiledRule {
    kind: TableKind,
    groups: Vec<Regex>,
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    TABLE_RULES
        .iter()
        .map(|rule| CompiledRule {
            kind: rule.kind,
            groups: rule
                .required
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).expect("valid table rule pattern"))
                .collect(),
        })
        .collect()
});

/// Kind of the first rule whose keyword groups are all present in `headers`.
pub fn classify(headers: &[String]) -> Option<TableKind> {
    COMPILED
        .iter()
        .find(|rule| {
            rule.groups
                .iter()
                .all(|re| headers.iter().any(|h| re.is_match(h)))
        })
        .map(|rule| rule.kind)
}

pub fn qualifies(headers: &[String], kind: TableKind) -> bool {
    classify(headers) == Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rankings_need_rank_and_win_rate() {
        assert!(qualifies(&h(&["순위", "팀", "경기", "승", "무", "패", "승률"]), TableKind::Rankings));
        assert!(qualifies(&h(&["Rank", "Team", "Win Rate"]), TableKind::Rankings));
        // A schedule table with a rank-looking header but no win rate.
        assert!(!qualifies(&h(&["순위", "시간", "경기", "구장"]), TableKind::Rankings));
    }

    #[test]
    fn offense_needs_avg_and_on_base_group() {
        assert!(qualifies(&h(&["순위", "팀", "타율", "OPS"]), TableKind::Offense));
        assert!(qualifies(&h(&["Rank", "AVG", "OBP"]), TableKind::Offense));
        assert!(!qualifies(&h(&["순위", "팀", "타율", "홈런"]), TableKind::Offense));
    }

    #[test]
    fn defense_needs_era_and_whip() {
        assert!(qualifies(&h(&["평균자책", "WHIP"]), TableKind::Defense));
        assert!(!qualifies(&h(&["ERA", "이닝"]), TableKind::Defense));
    }

    #[test]
    fn schedule_matches_either_rule() {
        assert!(qualifies(&h(&["시간", "경기", "중계"]), TableKind::Schedule));
        assert!(qualifies(&h(&["Time", "Stadium"]), TableKind::Schedule));
        assert!(!qualifies(&h(&["Time", "TV"]), TableKind::Schedule));
    }

    #[test]
    fn earlier_rule_wins() {
        // Has a rank and a 경기 column, but the win-rate group makes it a rankings table.
        let headers = h(&["순위", "팀", "경기", "승", "패", "승률"]);
        assert_eq!(classify(&headers), Some(TableKind::Rankings));
        assert!(!qualifies(&headers, TableKind::Schedule));
    }

    #[test]
    fn empty_headers_never_qualify() {
        for kind in [TableKind::Rankings, TableKind::Offense, TableKind::Defense, TableKind::Schedule] {
            assert!(!qualifies(&[], kind));
        }
    }
}
