use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::health::{HealthSnapshot, HealthState};
use crate::api::latency::{LatencyStats, SourceLatency};
use crate::config::STALE_WHILE_REVALIDATE_SECS;
use crate::error::AppError;
use crate::fetcher::{CacheMode, Fetcher, Source};
use crate::normalize::TopCategories;
use crate::schedule::{kst_today, resolve_date_window, seconds_until_next_boundary};
use crate::service::{self, RefreshOutcome};
use crate::types::{PlayerType, ScheduleGame, TeamDefense, TeamOffense, TeamRankSeries, TeamRanking};

#[derive(Clone)]
pub struct ApiState {
    pub fetcher: Arc<Fetcher>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/rankings", get(get_rankings))
        .route("/rankings/monthly", get(get_monthly_rankings))
        .route("/offense", get(get_offense))
        .route("/defense", get(get_defense))
        .route("/team-stats", get(get_team_stats))
        .route("/top-players", get(get_top_players))
        .route("/schedule", get(get_schedule))
        .route("/schedule/month", get(get_schedule_month))
        .route("/refresh-cache", get(refresh_cache).post(refresh_cache))
        .route("/debug/ranking-html", get(debug_ranking_html))
        .route("/debug/schedule-html", get(debug_schedule_html))
        .route("/debug/schedule-rows", get(debug_schedule_rows))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

/// `Query` rejecting with the JSON error envelope instead of axum's plain text.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `1` or `true` switches a flag on; anything else, or nothing, is off.
fn flag(v: &Option<String>) -> bool {
    matches!(v.as_deref().map(str::trim), Some("1") | Some("true"))
}

fn updated_at() -> String {
    Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TeamQuery {
    pub force: Option<String>,
    /// Season feed URL overriding `KBO_JSON_URL`.
    #[serde(alias = "jsonUrl")]
    pub source: Option<String>,
}

#[derive(Deserialize)]
pub struct MonthlyQuery {
    pub season: Option<i32>,
    pub force: Option<String>,
}

#[derive(Deserialize)]
pub struct TopPlayersQuery {
    #[serde(rename = "type")]
    pub player_type: Option<String>,
    pub force: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    pub date: Option<String>,
    pub no_store: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub no_store: Option<String>,
}

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingsResponse {
    pub ok: bool,
    pub updated_at: String,
    pub rankings: Vec<TeamRanking>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenseResponse {
    pub ok: bool,
    pub updated_at: String,
    pub offense: Vec<TeamOffense>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseResponse {
    pub ok: bool,
    pub updated_at: String,
    pub defense: Vec<TeamDefense>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatsResponse {
    pub ok: bool,
    pub updated_at: String,
    pub rankings: Vec<TeamRanking>,
    pub offense: Vec<TeamOffense>,
    pub defense: Vec<TeamDefense>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRankingsResponse {
    pub ok: bool,
    pub season: i32,
    pub months: Vec<String>,
    pub series: Vec<TeamRankSeries>,
    pub updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPlayersResponse {
    pub ok: bool,
    #[serde(rename = "type")]
    pub player_type: PlayerType,
    pub updated_at: String,
    pub categories: TopCategories,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub ok: bool,
    pub date: String,
    /// Seconds until the cached copy expires, 0 when uncached.
    pub revalidate_in: u64,
    pub tag: String,
    pub games: Vec<ScheduleGame>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMonthResponse {
    pub ok: bool,
    pub year: i32,
    /// Zero-padded, "09".
    pub month: String,
    pub revalidate_in: u64,
    pub games: Vec<ScheduleGame>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub ok: bool,
    pub revalidated: bool,
    #[serde(flatten)]
    pub outcome: RefreshOutcome,
}

#[derive(Serialize)]
pub struct ScheduleRowsResponse {
    pub ok: bool,
    pub year: i32,
    pub month: u32,
    pub data: Value,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_rankings(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<TeamQuery>,
) -> Result<Json<RankingsResponse>, AppError> {
    let rankings = service::load_team_table(&state.fetcher, flag(&params.force), params.source.as_deref()).await?;
    Ok(Json(RankingsResponse { ok: true, updated_at: updated_at(), rankings }))
}

async fn get_offense(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<TeamQuery>,
) -> Result<Json<OffenseResponse>, AppError> {
    let offense = service::load_team_table(&state.fetcher, flag(&params.force), params.source.as_deref()).await?;
    Ok(Json(OffenseResponse { ok: true, updated_at: updated_at(), offense }))
}

async fn get_defense(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<TeamQuery>,
) -> Result<Json<DefenseResponse>, AppError> {
    let defense = service::load_team_table(&state.fetcher, flag(&params.force), params.source.as_deref()).await?;
    Ok(Json(DefenseResponse { ok: true, updated_at: updated_at(), defense }))
}

async fn get_team_stats(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<TeamQuery>,
) -> Result<Json<TeamStatsResponse>, AppError> {
    let dash = service::load_team_dashboard(&state.fetcher, flag(&params.force), params.source.as_deref()).await?;
    Ok(Json(TeamStatsResponse {
        ok: true,
        updated_at: updated_at(),
        rankings: dash.rankings,
        offense: dash.offense,
        defense: dash.defense,
    }))
}

async fn get_monthly_rankings(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<MonthlyQuery>,
) -> Result<Json<MonthlyRankingsResponse>, AppError> {
    let cfg = state.fetcher.config();
    let json_url = cfg
        .kbo_json_url
        .clone()
        .ok_or_else(|| AppError::Config("KBO_JSON_URL not set".to_string()))?;
    let season = params.season.unwrap_or(cfg.season);

    let out = service::load_month_end_rankings(&state.fetcher, season, &json_url, flag(&params.force)).await?;
    Ok(Json(MonthlyRankingsResponse {
        ok: true,
        season,
        months: out.months,
        series: out.series,
        updated_at: updated_at(),
    }))
}

async fn get_top_players(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<TopPlayersQuery>,
) -> Result<Json<TopPlayersResponse>, AppError> {
    let player_type = match params.player_type.as_deref() {
        None => PlayerType::Hitter,
        Some(raw) => PlayerType::parse(raw)
            .ok_or_else(|| AppError::InvalidRequest("type must be HITTER or PITCHER".to_string()))?,
    };
    let categories = service::load_top_players(&state.fetcher, player_type, flag(&params.force)).await?;
    Ok(Json(TopPlayersResponse {
        ok: true,
        player_type,
        updated_at: updated_at(),
        categories,
    }))
}

fn schedule_cache_control(no_store: bool, revalidate_in: u64) -> String {
    if no_store {
        "no-store".to_string()
    } else {
        format!("s-maxage={revalidate_in}, stale-while-revalidate={STALE_WHILE_REVALIDATE_SECS}")
    }
}

async fn get_schedule(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<ScheduleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let no_store = flag(&params.no_store);
    let (window, games) = service::load_schedule_day(&state.fetcher, params.date.as_deref(), no_store, now).await?;

    let revalidate_in = if no_store { 0 } else { seconds_until_next_boundary(now) };
    let body = ScheduleResponse {
        ok: true,
        date: window.ymd(),
        revalidate_in,
        tag: window.tag(),
        games,
    };
    Ok(([(header::CACHE_CONTROL, schedule_cache_control(no_store, revalidate_in))], Json(body)))
}

async fn get_schedule_month(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<ScheduleMonthQuery>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let today = kst_today(now);
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());
    let no_store = flag(&params.no_store);

    let games = service::load_schedule_month(&state.fetcher, year, month, no_store, now).await?;

    let revalidate_in = if no_store { 0 } else { seconds_until_next_boundary(now) };
    let body = ScheduleMonthResponse {
        ok: true,
        year,
        month: format!("{month:02}"),
        revalidate_in,
        games,
    };
    Ok(([(header::CACHE_CONTROL, schedule_cache_control(no_store, revalidate_in))], Json(body)))
}

async fn refresh_cache(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<DateQuery>,
) -> Result<Json<RefreshResponse>, AppError> {
    let outcome = service::refresh_cache(&state.fetcher, params.date.as_deref(), Utc::now())?;
    Ok(Json(RefreshResponse { ok: true, revalidated: true, outcome }))
}

// ---------------------------------------------------------------------------
// Debug: raw upstream bodies, never cached
// ---------------------------------------------------------------------------

async fn debug_ranking_html(State(state): State<ApiState>) -> Result<impl IntoResponse, AppError> {
    let html = state.fetcher.fetch_text(&Source::RankingPage, &CacheMode::NoStore).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], html))
}

async fn debug_schedule_html(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<DateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = resolve_date_window(params.date.as_deref(), Utc::now())?;
    let html = state
        .fetcher
        .fetch_text(&Source::SchedulePage(Some(window.ymd())), &CacheMode::NoStore)
        .await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], html))
}

async fn debug_schedule_rows(
    State(state): State<ApiState>,
    ApiQuery(params): ApiQuery<MonthQuery>,
) -> Result<Json<ScheduleRowsResponse>, AppError> {
    let today = kst_today(Utc::now());
    let year = params.year.unwrap_or(today.year());
    let month = service::validate_month(params.month.unwrap_or(today.month()))?;
    let data: Value = state
        .fetcher
        .fetch_json(&Source::ScheduleList { year, month }, &CacheMode::NoStore)
        .await?;
    Ok(Json(ScheduleRowsResponse { ok: true, year, month, data }))
}

// ---------------------------------------------------------------------------
// Service health
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot(state.fetcher.cached_responses()))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<Vec<SourceLatency>> {
    Json(state.latency.snapshot())
}
