//! Fallback chains behind the routes.
//!
//! Every loader prefers the JSON feed, falls back to scraping HTML, and ends in
//! an empty list. Upstream unavailability never escapes a chain; invalid input
//! and anything that isn't an upstream failure do.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{tags, SEASON_MONTHS, TEAM_STATS_REVALIDATE_SECS};
use crate::error::{AppError, Result};
use crate::extract::{extract_tables, ExtractedTable};
use crate::fetcher::{CacheMode, Fetcher, Source};
use crate::normalize::{
    adapt_defense, adapt_offense, adapt_rankings, adapt_top_players, normalize_defense, normalize_offense,
    normalize_rankings, SeasonResponse, TopCategories, TopPlayersPayload,
};
use crate::schedule::kst::{last_day_of_month, schedule_month_tag};
use crate::schedule::{
    parse_schedule_html, resolve_date_window, resolve_day, resolve_month, rows_from_response,
    seconds_until_next_boundary, DateWindow, ScheduleRow,
};
use crate::types::{
    MonthEndRankings, MonthRank, PlayerType, ScheduleGame, TableKind, TeamDefense, TeamOffense, TeamRankSeries,
    TeamRanking,
};

/// `None` when the source is unavailable, so the caller can move on to the next one.
fn unless_unavailable<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_upstream() => Ok(None),
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Team tables
// ---------------------------------------------------------------------------

/// A team-level table that can come from the season feed or the ranking page.
pub trait TeamTable: Serialize + Sized + Send {
    const KIND: TableKind;
    fn from_season(resp: &SeasonResponse, logo_base: &str) -> Vec<Self>;
    fn from_tables(tables: &[ExtractedTable], logo_base: &str) -> Vec<Self>;

    fn from_page(html: &str, logo_base: &str) -> Vec<Self> {
        Self::from_tables(&extract_tables(html, Self::KIND), logo_base)
    }
}

impl TeamTable for TeamRanking {
    const KIND: TableKind = TableKind::Rankings;

    fn from_season(resp: &SeasonResponse, logo_base: &str) -> Vec<Self> {
        adapt_rankings(resp, logo_base)
    }

    fn from_tables(tables: &[ExtractedTable], logo_base: &str) -> Vec<Self> {
        normalize_rankings(tables, logo_base)
    }
}

impl TeamTable for TeamOffense {
    const KIND: TableKind = TableKind::Offense;

    fn from_season(resp: &SeasonResponse, logo_base: &str) -> Vec<Self> {
        adapt_offense(resp, logo_base)
    }

    fn from_tables(tables: &[ExtractedTable], logo_base: &str) -> Vec<Self> {
        normalize_offense(tables, logo_base)
    }
}

impl TeamTable for TeamDefense {
    const KIND: TableKind = TableKind::Defense;

    fn from_season(resp: &SeasonResponse, logo_base: &str) -> Vec<Self> {
        adapt_defense(resp, logo_base)
    }

    fn from_tables(tables: &[ExtractedTable], logo_base: &str) -> Vec<Self> {
        normalize_defense(tables, logo_base)
    }
}

/// One season feed and one ranking page serve all three team tables. Each is
/// fetched at most once per load, and only when needed.
struct TeamSources<'a> {
    fetcher: &'a Fetcher,
    mode: CacheMode,
    json_url: Option<String>,
    page: Option<Option<String>>,
}

impl<'a> TeamSources<'a> {
    /// Caller-supplied feed URL, else `KBO_JSON_URL`, else HTML only.
    fn new(fetcher: &'a Fetcher, force: bool, json_url: Option<&str>) -> Self {
        let json_url = json_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| fetcher.config().kbo_json_url.clone());
        Self {
            fetcher,
            mode: CacheMode::unless(force, TEAM_STATS_REVALIDATE_SECS, tags::TEAM.iter().copied()),
            json_url,
            page: None,
        }
    }

    fn logo_base(&self) -> &'a str {
        &self.fetcher.config().naver_mobile_url
    }

    async fn season(&self) -> Result<Option<SeasonResponse>> {
        let Some(url) = &self.json_url else {
            return Ok(None);
        };
        let source = Source::SeasonJson(url.clone());
        let resp = unless_unavailable(self.fetcher.fetch_json::<SeasonResponse>(&source, &self.mode).await)?;
        if let Some(r) = &resp {
            if r.teams().is_empty() {
                debug!(code = ?r.code, success = ?r.success, "season feed had no teams");
            }
        }
        Ok(resp)
    }

    async fn page(&mut self) -> Result<Option<&str>> {
        if self.page.is_none() {
            if self.json_url.is_some() {
                self.fetcher.health().record_html_fallback();
            }
            let html = self.fetcher.fetch_text(&Source::RankingPage, &self.mode).await;
            self.page = Some(unless_unavailable(html)?);
        }
        Ok(self.page.as_ref().and_then(|p| p.as_deref()))
    }

    /// `rows` as the feed gave them, or from the ranking page when the feed had none.
    async fn fill<T: TeamTable>(&mut self, rows: Vec<T>) -> Result<Vec<T>> {
        if !rows.is_empty() {
            info!(kind = %T::KIND, count = rows.len(), "team table from season feed");
            return Ok(rows);
        }
        let base = self.logo_base();
        let Some(html) = self.page().await? else {
            return Ok(Vec::new());
        };
        let rows = T::from_page(html, base);
        if rows.is_empty() {
            warn!(kind = %T::KIND, "ranking page had no usable rows");
        } else {
            info!(kind = %T::KIND, count = rows.len(), "team table from ranking page");
        }
        Ok(rows)
    }
}

/// Season feed → ranking page → empty.
pub async fn load_team_table<T: TeamTable>(fetcher: &Fetcher, force: bool, json_url: Option<&str>) -> Result<Vec<T>> {
    let mut sources = TeamSources::new(fetcher, force, json_url);
    let rows = match sources.season().await? {
        Some(resp) => T::from_season(&resp, sources.logo_base()),
        None => Vec::new(),
    };
    sources.fill(rows).await
}

#[derive(Debug, Serialize)]
pub struct TeamDashboard {
    pub rankings: Vec<TeamRanking>,
    pub offense: Vec<TeamOffense>,
    pub defense: Vec<TeamDefense>,
}

/// All three team tables from a single feed fetch, and at most one page fetch.
pub async fn load_team_dashboard(fetcher: &Fetcher, force: bool, json_url: Option<&str>) -> Result<TeamDashboard> {
    let mut sources = TeamSources::new(fetcher, force, json_url);
    let base = sources.logo_base();
    let (rankings, offense, defense) = match sources.season().await? {
        Some(resp) => (
            TeamRanking::from_season(&resp, base),
            TeamOffense::from_season(&resp, base),
            TeamDefense::from_season(&resp, base),
        ),
        None => (Vec::new(), Vec::new(), Vec::new()),
    };
    Ok(TeamDashboard {
        rankings: sources.fill(rankings).await?,
        offense: sources.fill(offense).await?,
        defense: sources.fill(defense).await?,
    })
}

// ---------------------------------------------------------------------------
// Month-end rankings
// ---------------------------------------------------------------------------

/// Standings as of one month's last day: dated feed (`YYYYMMDD`, then
/// `YYYY-MM-DD`), else the undated snapshot, else nothing.
async fn month_end_standings(
    fetcher: &Fetcher,
    url: &str,
    season: i32,
    month: u32,
    mode: &CacheMode,
) -> Result<Vec<TeamRanking>> {
    let base = fetcher.config().naver_mobile_url.as_str();
    if let Some(last) = last_day_of_month(season, month) {
        for date in [last.format("%Y%m%d").to_string(), last.format("%Y-%m-%d").to_string()] {
            let source = Source::SeasonJsonOnDate { url: url.to_string(), date };
            if let Some(resp) = unless_unavailable(fetcher.fetch_json::<SeasonResponse>(&source, mode).await)? {
                let ranks = adapt_rankings(&resp, base);
                if !ranks.is_empty() {
                    return Ok(ranks);
                }
            }
        }
    }

    debug!(season, month, "no dated standings, using current snapshot");
    let snapshot = fetcher.fetch_json::<SeasonResponse>(&Source::SeasonJson(url.to_string()), mode).await;
    Ok(unless_unavailable(snapshot)?
        .map(|resp| adapt_rankings(&resp, base))
        .unwrap_or_default())
}

pub fn month_label(month: u32) -> String {
    format!("{month}월")
}

/// Per-team rank series across the regular-season months. Teams appear in the
/// order first seen; months a team is missing from carry `null`.
pub fn build_rank_series(per_month: &[(u32, Vec<TeamRanking>)]) -> MonthEndRankings {
    let mut teams: Vec<String> = Vec::new();
    for (_, ranks) in per_month {
        for r in ranks {
            if !teams.contains(&r.team) {
                teams.push(r.team.clone());
            }
        }
    }

    let series = teams
        .into_iter()
        .map(|team| {
            let data = per_month
                .iter()
                .map(|(month, ranks)| MonthRank {
                    month: month_label(*month),
                    rank: ranks.iter().find(|r| r.team == team).map(|r| r.rank),
                })
                .collect();
            TeamRankSeries { team, data }
        })
        .collect();

    MonthEndRankings {
        months: per_month.iter().map(|(m, _)| month_label(*m)).collect(),
        series,
    }
}

/// Months are fetched concurrently.
pub async fn load_month_end_rankings(
    fetcher: &Fetcher,
    season: i32,
    json_url: &str,
    force: bool,
) -> Result<MonthEndRankings> {
    let mode = CacheMode::unless(force, TEAM_STATS_REVALIDATE_SECS, [tags::MONTHLY]);
    let results = join_all(SEASON_MONTHS.iter().map(|&month| {
        let mode = &mode;
        async move { month_end_standings(fetcher, json_url, season, month, mode).await.map(|r| (month, r)) }
    }))
    .await;
    let per_month = results.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(build_rank_series(&per_month))
}

// ---------------------------------------------------------------------------
// Top players
// ---------------------------------------------------------------------------

pub fn top_players_tag(player_type: PlayerType) -> &'static str {
    match player_type {
        PlayerType::Hitter => tags::TOP_HITTERS,
        PlayerType::Pitcher => tags::TOP_PITCHERS,
    }
}

/// Leaderboards have a single source, so upstream failure is an error here.
pub async fn load_top_players(fetcher: &Fetcher, player_type: PlayerType, force: bool) -> Result<TopCategories> {
    let mode = CacheMode::unless(force, TEAM_STATS_REVALIDATE_SECS, [top_players_tag(player_type)]);
    let json: Value = fetcher.fetch_json(&Source::TopPlayers(player_type), &mode).await?;
    let categories = adapt_top_players(player_type, &TopPlayersPayload::from_value(&json));
    info!(%player_type, categories = categories.len(), "top players");
    Ok(categories)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

fn schedule_cache_mode(no_store: bool, now: DateTime<Utc>, tags: Vec<String>) -> CacheMode {
    CacheMode::unless(no_store, seconds_until_next_boundary(now), tags)
}

async fn schedule_rows(fetcher: &Fetcher, year: i32, month: u32, mode: &CacheMode) -> Result<Vec<ScheduleRow>> {
    let json: Value = fetcher.fetch_json(&Source::ScheduleList { year, month }, mode).await?;
    Ok(rows_from_response(&json))
}

/// Games on one day: list feed → schedule page candidates → empty.
/// An explicit `date` is also tried in compact form; with no date, today's
/// forms come first and the bare page last.
pub async fn load_schedule_day(
    fetcher: &Fetcher,
    date: Option<&str>,
    no_store: bool,
    now: DateTime<Utc>,
) -> Result<(DateWindow, Vec<ScheduleGame>)> {
    let window = resolve_date_window(date, now)?;

    let list_mode = schedule_cache_mode(no_store, now, vec![window.tag(), window.month_tag()]);
    let listed = schedule_rows(fetcher, window.year(), window.month(), &list_mode).await;
    if let Some(rows) = unless_unavailable(listed)? {
        let games = resolve_day(&rows, window.date);
        if !games.is_empty() {
            info!(date = %window.ymd(), rows = rows.len(), count = games.len(), "schedule from list feed");
            return Ok((window, games));
        }
        debug!(date = %window.ymd(), rows = rows.len(), "list feed had no games for day");
    }
    fetcher.health().record_html_fallback();

    let explicit = date.map(str::trim).is_some_and(|d| !d.is_empty());
    let mut candidates = vec![Some(window.ymd()), Some(window.compact())];
    if !explicit {
        candidates.push(None);
    }

    let page_mode = schedule_cache_mode(no_store, now, vec![window.tag()]);
    for candidate in candidates {
        let page = fetcher.fetch_text(&Source::SchedulePage(candidate), &page_mode).await;
        if let Some(html) = unless_unavailable(page)? {
            let games = parse_schedule_html(&html);
            info!(date = %window.ymd(), count = games.len(), "schedule from page");
            return Ok((window, games));
        }
    }
    Ok((window, Vec::new()))
}

pub fn validate_month(month: u32) -> Result<u32> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(AppError::InvalidRequest(format!("month must be 1-12, got {month}")))
    }
}

/// Every dated game in a month. Upstream failure degrades to an empty list.
pub async fn load_schedule_month(
    fetcher: &Fetcher,
    year: i32,
    month: u32,
    no_store: bool,
    now: DateTime<Utc>,
) -> Result<Vec<ScheduleGame>> {
    let month = validate_month(month)?;
    let mode = schedule_cache_mode(no_store, now, vec![schedule_month_tag(year, month)]);
    let Some(rows) = unless_unavailable(schedule_rows(fetcher, year, month, &mode).await)? else {
        return Ok(Vec::new());
    };
    let games = resolve_month(&rows, year);
    info!(year, month, rows = rows.len(), count = games.len(), "month schedule");
    Ok(games)
}

// ---------------------------------------------------------------------------
// Cache refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RefreshOutcome {
    pub tags: Vec<String>,
    /// Cached responses dropped.
    pub cleared: usize,
    pub date: String,
}

/// Drop the team-table tags plus the schedule tags for `date` (default today).
pub fn refresh_cache(fetcher: &Fetcher, date: Option<&str>, now: DateTime<Utc>) -> Result<RefreshOutcome> {
    let window = resolve_date_window(date, now)?;
    let mut tags: Vec<String> = tags::TEAM.iter().map(|t| t.to_string()).collect();
    tags.push(window.tag());
    tags.push(window.month_tag());
    let cleared = fetcher.invalidate_tags(&tags);
    info!(cleared, tags = ?tags, "cache refreshed");
    Ok(RefreshOutcome { tags, cleared, date: window.ymd() })
}
