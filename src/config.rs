use crate::error::{AppError, Result};

pub const NAVER_MOBILE_URL: &str = "https://m.sports.naver.com";
pub const NAVER_API_URL: &str = "https://api-gw.sports.naver.com";
pub const KBO_SITE_URL: &str = "https://www.koreabaseball.com";

pub const DEFAULT_SEASON: i32 = 2025;

/// Client-level request timeout. Each upstream call is attempted exactly once.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// TTL for tagged team-stat and top-player responses.
pub const TEAM_STATS_REVALIDATE_SECS: u64 = 300;

/// Lower bound for any day-boundary TTL so a cache never gets a zero lifetime.
pub const MIN_BOUNDARY_TTL_SECS: u64 = 60;

/// `stale-while-revalidate` window advertised on schedule responses.
pub const STALE_WHILE_REVALIDATE_SECS: u64 = 60;

/// One entry per league team.
pub const TEAM_TABLE_CAP: usize = 10;
pub const LEADERBOARD_CAP: usize = 20;

/// Rows shorter than this are treated as malformed in team tables.
pub const MIN_TEAM_ROW_CELLS: usize = 6;

/// Months covered by the month-end rankings series (regular season).
pub const SEASON_MONTHS: &[u32] = &[4, 5, 6, 7, 8, 9, 10];

/// Cache tags shared by the fetch layer and the refresh endpoint.
pub mod tags {
    pub const TEAM_RANKINGS: &str = "kbo-team-rankings";
    pub const TEAM_OFFENSE: &str = "kbo-team-offense";
    pub const TEAM_DEFENSE: &str = "kbo-team-defense";
    pub const TOP_HITTERS: &str = "kbo-top-hitters";
    pub const TOP_PITCHERS: &str = "kbo-top-pitchers";
    pub const MONTHLY: &str = "kbo-monthly";
    /// Rankings, offense and defense share upstream documents, so they share tags.
    pub const TEAM: &[&str] = &[TEAM_RANKINGS, TEAM_OFFENSE, TEAM_DEFENSE];
    pub const SCHEDULE_PREFIX: &str = "kbo-schedule-";
    pub const SCHEDULE_MONTH_PREFIX: &str = "kbo-schedule-month-";
}

/// Browser identities presented upstream. Both providers reject obvious bot traffic.
pub mod headers {
    pub const MOBILE_SAFARI_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";
    pub const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121 Safari/537.36";
    pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
    pub const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
    pub const ACCEPT_LANGUAGE: &str = "ko,en-US;q=0.9,en;q=0.8";
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    /// Season used in upstream URLs (KBO_SEASON).
    pub season: i32,
    /// Team-stats JSON feed (KBO_JSON_URL). Absent → rankings/offense/defense are HTML-only.
    pub kbo_json_url: Option<String>,
    /// Naver mobile site root (NAVER_MOBILE_URL), serves the ranking page.
    pub naver_mobile_url: String,
    /// Naver API gateway root (NAVER_API_URL), serves top-player leaderboards.
    pub naver_api_url: String,
    /// koreabaseball.com root (KBO_SITE_URL), serves the schedule page and list service.
    pub kbo_site_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            season: std::env::var("KBO_SEASON")
                .ok()
                .map(|s| {
                    s.trim()
                        .parse::<i32>()
                        .map_err(|_| AppError::Config("KBO_SEASON must be a year".to_string()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SEASON),
            kbo_json_url: std::env::var("KBO_JSON_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            naver_mobile_url: base_url_from_env("NAVER_MOBILE_URL", NAVER_MOBILE_URL),
            naver_api_url: base_url_from_env("NAVER_API_URL", NAVER_API_URL),
            kbo_site_url: base_url_from_env("KBO_SITE_URL", KBO_SITE_URL),
        })
    }

    /// Config pointing every upstream at one base URL. Used by tests with a mock server.
    #[cfg(test)]
    pub fn for_upstream(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            log_level: "debug".to_string(),
            api_port: 0,
            season: DEFAULT_SEASON,
            kbo_json_url: None,
            naver_mobile_url: base.clone(),
            naver_api_url: base.clone(),
            kbo_site_url: base,
        }
    }
}

fn base_url_from_env(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
