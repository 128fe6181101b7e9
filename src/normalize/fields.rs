//! Text → value coercions shared by every normalizer.

use std::sync::LazyLock;

use regex::Regex;

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.\-]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Static logo paths for when the markup carries no `<img>`.
/// Korean short names and English names both map.
pub const TEAM_LOGOS: &[(&str, &str)] = &[
    ("LG", "/logos/lg.png"),
    ("KIA", "/logos/kia.png"),
    ("SSG", "/logos/ssg.png"),
    ("NC", "/logos/nc.png"),
    ("KT", "/logos/kt.png"),
    ("두산", "/logos/doosan.png"),
    ("롯데", "/logos/lotte.png"),
    ("삼성", "/logos/samsung.png"),
    ("한화", "/logos/hanwha.png"),
    ("키움", "/logos/kiwoom.png"),
    ("Doosan", "/logos/doosan.png"),
    ("Lotte", "/logos/lotte.png"),
    ("Samsung", "/logos/samsung.png"),
    ("Hanwha", "/logos/hanwha.png"),
    ("Kiwoom", "/logos/kiwoom.png"),
];

/// Strip everything but digits, `.` and `-`, then parse. Unparseable → 0.
pub fn norm_num(s: &str) -> f64 {
    NON_NUMERIC
        .replace_all(s, "")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// `norm_num` clamped to a non-negative integer.
pub fn norm_count(s: &str) -> u32 {
    f64_to_count(norm_num(s))
}

pub fn f64_to_count(n: f64) -> u32 {
    if n.is_finite() && n > 0.0 {
        n.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Collapse runs of whitespace (including line breaks) to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Round to `digits` decimal places.
pub fn round_to(n: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (n * factor).round() / factor
}

/// Resolve an `<img src>` against `base`, the upstream host that served the markup.
pub fn resolve_url(src: &str, base: &str) -> String {
    let src = src.trim();
    if src.is_empty() {
        return String::new();
    }
    let lower = src.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        src.to_string()
    } else if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else if src.starts_with('/') {
        format!("{}{src}", base.trim_end_matches('/'))
    } else {
        format!("{}/{src}", base.trim_end_matches('/'))
    }
}

/// Static logo for a team name, ignoring embedded whitespace.
pub fn static_logo(team: &str) -> Option<&'static str> {
    let compact: String = team.chars().filter(|c| !c.is_whitespace()).collect();
    TEAM_LOGOS
        .iter()
        .find(|(name, _)| *name == team || *name == compact)
        .map(|(_, path)| *path)
}

/// Keep `logo` if set, else fall back to the static table, else empty.
pub fn logo_or_static(logo: String, team: &str) -> String {
    if !logo.is_empty() {
        return logo;
    }
    static_logo(team).map(str::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_num_strips_noise() {
        assert_eq!(norm_num("1위"), 1.0);
        assert_eq!(norm_num(" 0.615 "), 0.615);
        assert_eq!(norm_num("-2.5"), -2.5);
        assert_eq!(norm_num("1,234"), 1234.0);
        assert_eq!(norm_num("-"), 0.0);
        assert_eq!(norm_num(""), 0.0);
        assert_eq!(norm_num("1.2.3"), 0.0);
    }

    #[test]
    fn counts_never_negative() {
        assert_eq!(norm_count("80승"), 80);
        assert_eq!(norm_count("-3"), 0);
        assert_eq!(norm_count("abc"), 0);
    }

    #[test]
    fn collapse_whitespace() {
        assert_eq!(collapse_ws("  LG\n  트윈스\t"), "LG 트윈스");
    }

    #[test]
    fn resolve_logo_urls() {
        let base = crate::config::NAVER_MOBILE_URL;
        assert_eq!(resolve_url("https://cdn.example/lg.png", base), "https://cdn.example/lg.png");
        assert_eq!(resolve_url("//cdn.example/lg.png", base), "https://cdn.example/lg.png");
        assert_eq!(resolve_url("/img/lg.png", base), "https://m.sports.naver.com/img/lg.png");
        assert_eq!(resolve_url("img/lg.png", base), "https://m.sports.naver.com/img/lg.png");
        assert_eq!(resolve_url("", base), "");
    }

    #[test]
    fn relative_logos_follow_configured_host() {
        assert_eq!(resolve_url("/img/lg.png", "http://127.0.0.1:8080/"), "http://127.0.0.1:8080/img/lg.png");
        assert_eq!(resolve_url("img/lg.png", "http://mirror.local"), "http://mirror.local/img/lg.png");
    }

    #[test]
    fn static_logo_lookup() {
        assert_eq!(static_logo("두산"), Some("/logos/doosan.png"));
        assert_eq!(static_logo(" K IA "), Some("/logos/kia.png"));
        assert_eq!(static_logo("Unknown"), None);
        assert_eq!(logo_or_static("https://x/lg.png".into(), "LG"), "https://x/lg.png");
        assert_eq!(logo_or_static(String::new(), "LG"), "/logos/lg.png");
    }
}
