//! Fetches search pages and video details from upstream catalog sites.
//!
//! Every page fetch goes through [`SearchCache`] first; 403 and timeout
//! outcomes are cached negatively so a misbehaving site is skipped for
//! the cache TTL instead of being hammered on every request.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use crate::cache::{PageStatus, SearchCache};
use crate::extract::{
    clean_title, extract_episodes, extract_year, strip_html_tags, FFZY_PATTERN, M3U8_PATTERN,
};
use crate::registry::ApiSite;

use super::types::{decode_search_body, ApiDetailResponse, ApiSearchItem, UpstreamError, VideoResult};

/// Deadline for a single search page request.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(8);
/// Deadline for a detail request (JSON or HTML).
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

static H1_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<h1[^>]*>([^<]+)</h1>").unwrap());
static SKETCH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div[^>]*class=["']sketch["'][^>]*>([\s\S]*?)</div>"#).unwrap());
static COVER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(https?://[^"'\s]+?\.jpg)"#).unwrap());
static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r">(\d{4})<").unwrap());

/// Shared client for all upstream catalog traffic.
pub struct UpstreamClient {
    http: reqwest::Client,
    cache: Arc<SearchCache>,
}

impl UpstreamClient {
    pub fn new(cache: Arc<SearchCache>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { http, cache }
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Search one site across up to `max_pages` pages.
    ///
    /// Page 1 is fetched first to learn the total page count; remaining
    /// pages are fetched concurrently and failed pages are dropped.
    pub async fn search_site(
        &self,
        site: &ApiSite,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<VideoResult>, UpstreamError> {
        let (mut results, page_count) = self.fetch_search_page(site, query, 1).await?;

        let total_pages = page_count.unwrap_or(1).min(max_pages);
        if total_pages > 1 {
            let fetches = (2..=total_pages).map(|page| self.fetch_search_page(site, query, page));
            for outcome in join_all(fetches).await {
                match outcome {
                    Ok((page_results, _)) => results.extend(page_results),
                    Err(e) => debug!(site = %site.key, error = %e, "search page dropped"),
                }
            }
        }

        Ok(results)
    }

    /// Fetch a single search page, consulting the cache first.
    ///
    /// A cached negative outcome (forbidden or timeout) is returned as an
    /// empty success so the site is silently skipped until the entry
    /// expires. A fresh 403 or timeout stores the negative entry and then
    /// fails, so the first request against a bad site is still reported.
    pub async fn fetch_search_page(
        &self,
        site: &ApiSite,
        query: &str,
        page: u32,
    ) -> Result<(Vec<VideoResult>, Option<u32>), UpstreamError> {
        let cache_key = SearchCache::key(&site.key, query, page);
        if let Some(entry) = self.cache.get(&cache_key) {
            return match entry.status {
                PageStatus::Ok => Ok((entry.data, entry.page_count)),
                PageStatus::Forbidden | PageStatus::Timeout => Ok((Vec::new(), None)),
            };
        }

        let encoded = urlencoding::encode(query);
        let url = if page == 1 {
            format!("{}?ac=videolist&wd={}", site.api, encoded)
        } else {
            format!("{}?ac=videolist&wd={}&pg={}", site.api, encoded, page)
        };

        let response = match self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                self.cache
                    .set(cache_key, PageStatus::Timeout, Vec::new(), None);
                return Err(UpstreamError::Timeout);
            }
            Err(e) => return Err(UpstreamError::Request(e.to_string())),
        };

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            self.cache
                .set(cache_key, PageStatus::Forbidden, Vec::new(), None);
            return Err(UpstreamError::Forbidden);
        }
        if !status.is_success() {
            return Err(UpstreamError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let (items, page_count) = decode_search_body(&body)?;
        if items.is_empty() {
            // Empty lists are not cached; a site may index the title later.
            return Ok((Vec::new(), None));
        }

        let results: Vec<VideoResult> = items
            .into_iter()
            .map(|item| normalize_item(item, site))
            .filter(|result| !result.episodes.is_empty())
            .collect();

        let page_count = if page == 1 { page_count } else { None };
        self.cache
            .set(cache_key, PageStatus::Ok, results.clone(), page_count);
        Ok((results, page_count))
    }

    /// Fetch the detail of one video by upstream id.
    ///
    /// Sites with a `detail` base URL are scraped from their HTML detail
    /// page; everyone else is queried over the JSON detail endpoint.
    pub async fn fetch_detail(
        &self,
        site: &ApiSite,
        id: &str,
    ) -> Result<VideoResult, UpstreamError> {
        if !site.detail.is_empty() {
            return self.scrape_detail_page(site, id).await;
        }

        let url = format!("{}?ac=videolist&ids={}", site.api, id);
        let body = self.fetch_detail_body(&url).await?;

        let data: ApiDetailResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let item = data.list.into_iter().next().ok_or(UpstreamError::EmptyDetail)?;

        let raw_content = item.vod_content.clone();
        let mut result = normalize_item(item, site);
        result.id = id.to_string();

        // Some sites only carry playable links inside the description
        // HTML, so scan it before stripping.
        if result.episodes.is_empty() {
            if let Some(content) = raw_content.as_deref().filter(|c| !c.is_empty()) {
                result.episodes = M3U8_PATTERN
                    .find_iter(content)
                    .map(|m| m.as_str().trim_start_matches('$').to_string())
                    .collect();
                result.episodes_titles = (1..=result.episodes.len())
                    .map(|n| n.to_string())
                    .collect();
            }
        }

        Ok(result)
    }

    async fn scrape_detail_page(
        &self,
        site: &ApiSite,
        id: &str,
    ) -> Result<VideoResult, UpstreamError> {
        let url = format!("{}/index.php/vod/detail/id/{}.html", site.detail, id);
        let html = self.fetch_detail_body(&url).await?;
        Ok(parse_detail_page(&html, site, id))
    }

    async fn fetch_detail_body(&self, url: &str) -> Result<String, UpstreamError> {
        let response = match self
            .http
            .get(url)
            .header("Accept", "application/json")
            .timeout(DETAIL_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(UpstreamError::Timeout),
            Err(e) => return Err(UpstreamError::Request(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::HttpStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))
    }
}

/// Parse a scraped HTML detail page into the normalized result shape.
///
/// Episode links are deduped preserving order and truncated at the
/// first `(`; their titles are generated as `"1"`, `"2"`, ...
fn parse_detail_page(html: &str, site: &ApiSite, id: &str) -> VideoResult {
    // ffzy serves a date+hash link shape; try it before the generic one.
    let mut matches: Vec<&str> = if site.key == "ffzy" {
        FFZY_PATTERN.find_iter(html).map(|m| m.as_str()).collect()
    } else {
        Vec::new()
    };
    if matches.is_empty() {
        matches = M3U8_PATTERN.find_iter(html).map(|m| m.as_str()).collect();
    }

    let mut episodes: Vec<String> = Vec::new();
    for m in matches {
        let mut link = m.trim_start_matches('$');
        if let Some(paren) = link.find('(').filter(|&i| i > 0) {
            link = &link[..paren];
        }
        if !episodes.iter().any(|e| e == link) {
            episodes.push(link.to_string());
        }
    }
    let episodes_titles: Vec<String> = (1..=episodes.len()).map(|n| n.to_string()).collect();

    let title = H1_PATTERN
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let desc = SKETCH_PATTERN
        .captures(html)
        .map(|c| strip_html_tags(&c[1]))
        .unwrap_or_default();
    let poster = COVER_PATTERN
        .find(html)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let year = YEAR_PATTERN
        .captures(html)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "unknown".to_string());

    VideoResult {
        id: id.to_string(),
        title,
        poster,
        episodes,
        episodes_titles,
        source: site.key.clone(),
        source_name: site.name.clone(),
        class: None,
        year,
        desc: Some(desc),
        type_name: None,
        douban_id: None,
    }
}

/// Convert one upstream item into the normalized result shape.
fn normalize_item(item: ApiSearchItem, site: &ApiSite) -> VideoResult {
    let (episodes, episodes_titles) = item
        .vod_play_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(extract_episodes)
        .unwrap_or_default();

    let year = item
        .vod_year
        .as_deref()
        .filter(|y| !y.is_empty())
        .map(extract_year)
        .unwrap_or_else(|| "unknown".to_string());

    let desc = item
        .vod_content
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(strip_html_tags);

    VideoResult {
        id: item.vod_id.to_string(),
        title: clean_title(&item.vod_name),
        poster: item.vod_pic,
        episodes,
        episodes_titles,
        source: site.key.clone(),
        source_name: site.name.clone(),
        class: item.vod_class,
        year,
        desc,
        type_name: item.type_name,
        douban_id: item.vod_douban_id,
    }
}
