//! Pure string transforms for upstream catalog payloads.
//!
//! Upstream sites encode playable episodes inside a single `vod_play_url`
//! field: play-source groups are separated by `$$$`, episodes within a
//! group by `#`, and each episode is a `title$url` pair. Only HLS
//! (`.m3u8`) entries count; the group with the most episodes wins.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Generic HLS link pattern, optionally prefixed with `$` by the upstream.
pub static M3U8_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\$?(https?://[^"'\s]+?\.m3u8)"#).unwrap());

/// Stricter date+hash path shape used by the `ffzy` source; tried before
/// the generic pattern when scraping that source's detail pages.
pub static FFZY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\$(https?://[^"'\s]+?/\d{8}/\d+_[a-f0-9]+/index\.m3u8)"#).unwrap());

/// Extract `(episode urls, episode titles)` from a `vod_play_url` field.
///
/// Both vectors are always the same length. When no group contains a
/// valid `.m3u8` entry, both are empty.
pub fn extract_episodes(vod_play_url: &str) -> (Vec<String>, Vec<String>) {
    let mut episodes: Vec<String> = Vec::new();
    let mut titles: Vec<String> = Vec::new();

    for group in vod_play_url.split("$$$") {
        let mut group_episodes: Vec<String> = Vec::new();
        let mut group_titles: Vec<String> = Vec::new();

        for entry in group.split('#') {
            let parts: Vec<&str> = entry.split('$').collect();
            if parts.len() == 2 && parts[1].ends_with(".m3u8") {
                group_titles.push(parts[0].to_string());
                group_episodes.push(parts[1].to_string());
            }
        }

        if group_episodes.len() > episodes.len() {
            episodes = group_episodes;
            titles = group_titles;
        }
    }

    (episodes, titles)
}

/// Return the first 4-digit run in `year_str`, or `"unknown"`.
pub fn extract_year(year_str: &str) -> String {
    FOUR_DIGITS
        .find(year_str)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Remove all `<...>` spans and trim the remainder.
pub fn strip_html_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, "").trim().to_string()
}

/// Trim and collapse whitespace runs to a single space.
pub fn clean_title(title: &str) -> String {
    WHITESPACE.replace_all(title.trim(), " ").to_string()
}
