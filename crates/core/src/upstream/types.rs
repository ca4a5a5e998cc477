//! Wire types for upstream catalog responses and the normalized result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A normalized video entry, tagged with the source it came from.
///
/// `episodes` and `episodes_titles` are always the same length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResult {
    pub id: String,
    pub title: String,
    pub poster: String,
    pub episodes: Vec<String>,
    pub episodes_titles: Vec<String>,
    pub source: String,
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub douban_id: Option<i64>,
}

/// Upstream search item in the common shape: integer `vod_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSearchItem {
    pub vod_id: i64,
    pub vod_name: String,
    #[serde(default)]
    pub vod_pic: String,
    #[serde(default)]
    pub vod_remarks: Option<String>,
    #[serde(default)]
    pub vod_play_url: Option<String>,
    #[serde(default)]
    pub vod_class: Option<String>,
    #[serde(default)]
    pub vod_year: Option<String>,
    #[serde(default)]
    pub vod_content: Option<String>,
    #[serde(default)]
    pub vod_douban_id: Option<i64>,
    #[serde(default)]
    pub type_name: Option<String>,
}

/// Variant shape served by some sites: `vod_id` is a decimal string.
#[derive(Debug, Clone, Deserialize)]
struct ApiSearchItemStringId {
    vod_id: String,
    vod_name: String,
    #[serde(default)]
    vod_pic: String,
    #[serde(default)]
    vod_remarks: Option<String>,
    #[serde(default)]
    vod_play_url: Option<String>,
    #[serde(default)]
    vod_class: Option<String>,
    #[serde(default)]
    vod_year: Option<String>,
    #[serde(default)]
    vod_content: Option<String>,
    #[serde(default)]
    vod_douban_id: Option<i64>,
    #[serde(default)]
    type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    list: Vec<ApiSearchItem>,
    #[serde(default)]
    pagecount: i64,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponseStringId {
    #[serde(default)]
    list: Vec<ApiSearchItemStringId>,
    #[serde(default)]
    pagecount: i64,
}

/// Response of the `?ac=videolist&ids=` detail endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiDetailResponse {
    #[serde(default)]
    pub list: Vec<ApiSearchItem>,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned 403 Forbidden")]
    Forbidden,

    #[error("upstream HTTP error: {0}")]
    HttpStatus(u16),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    #[error("detail response contained no entries")]
    EmptyDetail,
}

/// Decode a search response body, tolerating both known id shapes.
///
/// The integer-id shape is tried first; on failure the string-id shape
/// is tried, with entries whose id does not parse as an integer dropped.
/// When both fail, the first decode error is returned.
pub fn decode_search_body(body: &str) -> Result<(Vec<ApiSearchItem>, Option<u32>), UpstreamError> {
    let first_err = match serde_json::from_str::<ApiSearchResponse>(body) {
        Ok(response) => {
            let page_count = (response.pagecount > 0).then_some(response.pagecount as u32);
            return Ok((response.list, page_count));
        }
        Err(e) => e,
    };

    match serde_json::from_str::<ApiSearchResponseStringId>(body) {
        Ok(response) => {
            let page_count = (response.pagecount > 0).then_some(response.pagecount as u32);
            let items = response
                .list
                .into_iter()
                .filter_map(|item| {
                    let vod_id = item.vod_id.parse::<i64>().ok()?;
                    Some(ApiSearchItem {
                        vod_id,
                        vod_name: item.vod_name,
                        vod_pic: item.vod_pic,
                        vod_remarks: item.vod_remarks,
                        vod_play_url: item.vod_play_url,
                        vod_class: item.vod_class,
                        vod_year: item.vod_year,
                        vod_content: item.vod_content,
                        vod_douban_id: item.vod_douban_id,
                        type_name: item.type_name,
                    })
                })
                .collect();
            Ok((items, page_count))
        }
        Err(_) => Err(UpstreamError::Decode(first_err.to_string())),
    }
}
