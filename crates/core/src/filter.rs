//! Category blocklist applied to normalized search results.

use crate::upstream::VideoResult;

/// Category substrings that mark a result as adult content.
const BLOCKED_CATEGORY_WORDS: &[&str] = &[
    "伦理片",
    "福利",
    "里番动漫",
    "门事件",
    "萝莉少女",
    "制服诱惑",
    "国产传媒",
    "cosplay",
    "黑丝诱惑",
    "无码",
    "日本无码",
    "有码",
    "日本有码",
    "SWAG",
    "网红主播",
    "色情片",
    "同性片",
    "福利视频",
    "福利片",
    "写真热舞",
    "倫理片",
    "理论片",
    "韩国伦理",
    "港台三级",
    "电影解说",
    "伦理",
    "日本伦理",
];

/// Drop results whose `type_name` contains any blocklist token.
/// Results without a `type_name` pass through unchanged.
pub fn filter_adult_content(results: Vec<VideoResult>) -> Vec<VideoResult> {
    results
        .into_iter()
        .filter(|result| match &result.type_name {
            Some(type_name) => !BLOCKED_CATEGORY_WORDS
                .iter()
                .any(|word| type_name.contains(word)),
            None => true,
        })
        .collect()
}
