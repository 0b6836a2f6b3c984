//! Which streaming platform a link points at, and who it points to.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Kick,
    Twitch,
    /// Not decided yet; the roster's "to be confirmed" marker.
    Pendiente,
}

struct Rule {
    domain:   &'static str,
    platform: Platform,
    username: Regex,
}

/* evaluated top to bottom, first hit wins */
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    [("kick.com", Platform::Kick), ("twitch.tv", Platform::Twitch)]
        .into_iter()
        .map(|(domain, platform)| Rule {
            domain,
            platform,
            username: Regex::new(&format!(r"(?i){}/([^/?]+)", regex::escape(domain)))
                .expect("static username pattern"),
        })
        .collect()
});

static YOUTUBE: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?youtube\.com/(?:c/|channel/|user/|@)?([a-zA-Z0-9_-]+)")
            .expect("static youtube pattern"),
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]+)")
            .expect("static youtu.be pattern"),
    ]
});

/// First platform whose domain appears in `link`.
pub fn detect_platform(link: &str) -> Option<Platform> {
    RULES.iter().find(|r| link.contains(r.domain)).map(|r| r.platform)
}

/// Channel name out of `<domain>/<name>`, cut at the first `/` or `?`.
pub fn extract_username(platform: Platform, url: &str) -> Option<String> {
    let rule = RULES.iter().find(|r| r.platform == platform)?;
    rule.username.captures(url).map(|c| c[1].to_string())
}

/// A YouTube channel link hiding somewhere in free text.
///
/// Full matches that already carry a scheme come back as-is; bare handles
/// are turned into `https://youtube.com/@<handle>`.
pub fn extract_youtube_link(text: &str) -> Option<String> {
    YOUTUBE.iter().find_map(|re| {
        let c = re.captures(text)?;
        let whole = c.get(0)?.as_str();
        Some(if whole.starts_with("http") {
            whole.to_string()
        } else {
            format!("https://youtube.com/@{}", &c[1])
        })
    })
}
