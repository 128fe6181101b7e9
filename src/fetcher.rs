//! Fetch Adapter: every upstream call goes through [`Fetcher`].
//!
//! Each call is a single attempt with browser-like headers. Tagged calls are
//! served from and stored into the [`ResponseCache`]; `NoStore` calls bypass it
//! in both directions. A body is only cached once it has parsed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::{headers, Config, UPSTREAM_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::state::ResponseCache;
use crate::types::PlayerType;

// ---------------------------------------------------------------------------
// Source / CacheMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Naver mobile team-rank page (HTML).
    RankingPage,
    /// Team-stats JSON feed at a configured or caller-supplied URL.
    SeasonJson(String),
    /// The same feed pinned to a date (`YYYYMMDD` or `YYYY-MM-DD`).
    SeasonJsonOnDate { url: String, date: String },
    /// Naver leaderboard API.
    TopPlayers(PlayerType),
    /// koreabaseball.com monthly schedule list service (form POST).
    ScheduleList { year: i32, month: u32 },
    /// koreabaseball.com schedule page, optionally for a date.
    SchedulePage(Option<String>),
}

impl Source {
    /// Short name for logs and latency buckets.
    pub fn label(&self) -> &'static str {
        match self {
            Source::RankingPage => "ranking-page",
            Source::SeasonJson(_) => "season-json",
            Source::SeasonJsonOnDate { .. } => "season-json-dated",
            Source::TopPlayers(_) => "top-players",
            Source::ScheduleList { .. } => "schedule-list",
            Source::SchedulePage(_) => "schedule-page",
        }
    }

    pub fn url(&self, cfg: &Config) -> String {
        match self {
            Source::RankingPage => format!(
                "{}/kbaseball/record/kbo?seasonCode={}&tab=teamRank",
                cfg.naver_mobile_url, cfg.season
            ),
            Source::SeasonJson(url) => url.clone(),
            Source::SeasonJsonOnDate { url, date } => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{url}{sep}date={date}")
            }
            Source::TopPlayers(kind) => format!(
                "{}/statistics/categories/kbo/seasons/{}/top-players?limit=30&rankFlag=Y&playerType={kind}",
                cfg.naver_api_url, cfg.season
            ),
            Source::ScheduleList { .. } => format!("{}/ws/Schedule.asmx/GetScheduleList", cfg.kbo_site_url),
            Source::SchedulePage(None) => schedule_page_url(cfg),
            Source::SchedulePage(Some(date)) => format!("{}?date={date}", schedule_page_url(cfg)),
        }
    }

    /// Form fields for POST sources.
    pub fn form(&self) -> Option<Vec<(&'static str, String)>> {
        match self {
            Source::ScheduleList { year, month } => Some(vec![
                ("leId", "1".to_string()),
                ("srIdList", "0,9,6".to_string()),
                ("seasonId", year.to_string()),
                ("gameMonth", format!("{month:02}")),
                ("teamId", String::new()),
            ]),
            _ => None,
        }
    }

    fn is_kbo_site(&self) -> bool {
        matches!(self, Source::ScheduleList { .. } | Source::SchedulePage(_))
    }

    fn wants_html(&self) -> bool {
        matches!(self, Source::RankingPage | Source::SchedulePage(_))
    }

    fn cache_key(&self, url: &str) -> String {
        match self.form() {
            Some(fields) => {
                let body: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("POST {url} {}", body.join("&"))
            }
            None => format!("GET {url}"),
        }
    }
}

fn schedule_page_url(cfg: &Config) -> String {
    format!("{}/Schedule/Schedule.aspx", cfg.kbo_site_url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    NoStore,
    Tagged { revalidate_secs: u64, tags: Vec<String> },
}

impl CacheMode {
    pub fn tagged<I, S>(revalidate_secs: u64, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CacheMode::Tagged {
            revalidate_secs,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// `NoStore` when `bypass`, else tagged.
    pub fn unless<I, S>(bypass: bool, revalidate_secs: u64, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if bypass {
            CacheMode::NoStore
        } else {
            CacheMode::tagged(revalidate_secs, tags)
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

pub struct Fetcher {
    client: reqwest::Client,
    config: Config,
    cache: ResponseCache,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl Fetcher {
    pub fn new(config: Config, health: Arc<HealthState>, latency: Arc<LatencyStats>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            config,
            cache: ResponseCache::new(),
            health,
            latency,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// Raw body of `source`.
    pub async fn fetch_text(&self, source: &Source, mode: &CacheMode) -> Result<String> {
        self.fetch_parsed(source, mode, |body| Ok(body.to_string())).await
    }

    /// Body of `source` decoded as JSON, tolerating junk before the object.
    pub async fn fetch_json<T: DeserializeOwned>(&self, source: &Source, mode: &CacheMode) -> Result<T> {
        self.fetch_parsed(source, mode, parse_lenient::<T>).await
    }

    /// Drop every cached response carrying any of `tags`.
    pub fn invalidate_tags(&self, tags: &[String]) -> usize {
        tags.iter().map(|t| self.cache.invalidate_tag(t)).sum()
    }

    async fn fetch_parsed<T, F>(&self, source: &Source, mode: &CacheMode, parse: F) -> Result<T>
    where
        F: Fn(&str) -> Result<T>,
    {
        let url = source.url(&self.config);
        let key = source.cache_key(&url);

        if let CacheMode::Tagged { .. } = mode {
            if let Some(body) = self.cache.get(&key) {
                if let Ok(parsed) = parse(&body) {
                    self.health.record_cache_hit();
                    debug!(source = source.label(), %url, "cache hit");
                    return Ok(parsed);
                }
            }
        }

        self.health.record_request();
        let started = Instant::now();
        let result = self.send(source, &url).await;
        let elapsed = started.elapsed();
        self.latency.record(source.label(), elapsed);

        let parsed = result.and_then(|body| parse(&body).map(|parsed| (body, parsed)));
        match parsed {
            Ok((body, parsed)) => {
                self.health.record_success(chrono::Utc::now().timestamp().max(0) as u64);
                debug!(
                    source = source.label(),
                    %url,
                    bytes = body.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "upstream ok"
                );
                if let CacheMode::Tagged { revalidate_secs, tags } = mode {
                    self.cache.put(&key, body, Duration::from_secs(*revalidate_secs), tags);
                }
                Ok(parsed)
            }
            Err(e) => {
                self.health.record_failure();
                warn!(
                    source = source.label(),
                    %url,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "upstream failed"
                );
                Err(e)
            }
        }
    }

    async fn send(&self, source: &Source, url: &str) -> Result<String> {
        let mut req = match source.form() {
            Some(fields) => self.client.post(url).form(&fields),
            None => self.client.get(url),
        };

        let ua = if source.is_kbo_site() {
            headers::DESKTOP_CHROME_UA
        } else {
            headers::MOBILE_SAFARI_UA
        };
        let accept = if source.wants_html() {
            headers::ACCEPT_HTML
        } else {
            headers::ACCEPT_JSON
        };
        req = req
            .header(USER_AGENT, ua)
            .header(ACCEPT, accept)
            .header(ACCEPT_LANGUAGE, headers::ACCEPT_LANGUAGE);
        if source.is_kbo_site() {
            req = req.header(REFERER, schedule_page_url(&self.config));
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// Strict parse, then a retry on the trailing `{...}` object of the body.
pub fn parse_lenient<T: DeserializeOwned>(body: &str) -> Result<T> {
    let first_err = match serde_json::from_str::<T>(body) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    let trimmed = body.trim_end();
    let object = trimmed
        .find('{')
        .filter(|_| trimmed.ends_with('}'))
        .map(|start| &trimmed[start..]);
    match object {
        Some(obj) => serde_json::from_str(obj)
            .map_err(|e| AppError::MalformedPayload(format!("{first_err}; trailing object: {e}"))),
        None => Err(AppError::MalformedPayload(first_err.to_string())),
    }
}
