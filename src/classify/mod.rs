//! # 批量分类模块
//!
//! 把一个批次的全部文件名在一次外部调用中发给分类服务，返回
//! 文件名 → 识别结果 的映射。
//!
//! ## 约定
//! - 每个批次恰好一次外部调用
//! - 映射中缺失的文件名视为无法识别（由流水线标记为 "unclassified"）
//! - 整体调用失败时返回 `ClassifyError`，不尝试部分分类
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 使用
//! - 子模块: gemini
//! - 使用 `models/identification.rs`

pub mod gemini;

pub use gemini::GeminiClassifier;

use crate::models::{Identification, MediaType};

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// 文件名 → 识别结果
pub type ClassificationMap = HashMap<String, Identification>;

/// 整批分类错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    /// 凭据缺失或被拒绝（致命，不重试）
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClassifyError {
    /// 是否应中止整个运行
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClassifyError::Auth(_))
    }
}

/// 批量文件名分类器
pub trait Classifier: Send + Sync {
    /// 分类一个批次的文件名（保持输入顺序）
    fn classify(&self, filenames: &[String]) -> Result<ClassificationMap, ClassifyError>;
}

/// 将按序号对齐的 JSON 数组转换为映射
///
/// 数组短于输入时，多出的文件名不出现在映射中（即无法识别）；长于输入时截断。
/// 同名文件取第一次出现的结果。
pub fn align_by_index(filenames: &[String], items: &[Value]) -> ClassificationMap {
    let mut map = ClassificationMap::with_capacity(filenames.len());
    for (filename, item) in filenames.iter().zip(items.iter()) {
        map.entry(filename.clone())
            .or_insert_with(|| identification_from_json(item));
    }
    map
}

/// 宽松解析单个识别对象（数字字段兼容字符串形式）
pub fn identification_from_json(item: &Value) -> Identification {
    let media_type = match item.get("type").and_then(Value::as_str) {
        Some(t) => match t.to_ascii_lowercase().as_str() {
            "tv" | "tv-episode" | "episode" | "show" => MediaType::TvEpisode,
            "movie" | "film" => MediaType::Movie,
            _ => return Identification::unknown(),
        },
        None => return Identification::unknown(),
    };

    let text = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let number = |key: &str| match item.get(key) {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    let confidence = item
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(0.0);

    let ident = Identification {
        media_type,
        name: text("name").unwrap_or_default(),
        year: number("year"),
        season: number("season"),
        episode: number("episode"),
        episode_title: None,
        is_special: item
            .get("is_special")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        confidence,
    };
    match text("episode_title") {
        Some(title) => ident.with_title(title),
        None => ident,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identification_from_json() {
        let item = json!({
            "type": "tv",
            "name": "The Bear",
            "season": "1",
            "episode": 2,
            "episode_title": "Hands",
            "confidence": 0.93
        });
        let ident = identification_from_json(&item);
        assert_eq!(ident.media_type, MediaType::TvEpisode);
        assert_eq!(ident.name, "The Bear");
        assert_eq!(ident.season, Some(1));
        assert_eq!(ident.episode, Some(2));
        assert_eq!(ident.episode_title.as_deref(), Some("Hands"));
        assert!((ident.confidence - 0.93).abs() < 1e-6);
        assert!(!ident.is_special);
    }

    #[test]
    fn test_unknown_type() {
        let ident = identification_from_json(&json!({ "type": "documentary?" }));
        assert_eq!(ident.media_type, MediaType::Unknown);
        assert_eq!(ident.confidence, 0.0);
    }

    #[test]
    fn test_align_by_index_short_and_long() {
        let names: Vec<String> = vec!["a.mkv".into(), "b.mkv".into(), "c.mkv".into()];

        let short = vec![json!({ "type": "movie", "name": "A" })];
        let map = align_by_index(&names, &short);
        assert_eq!(map.len(), 1);
        assert_eq!(map["a.mkv"].name, "A");
        assert!(!map.contains_key("b.mkv"));

        let long = vec![
            json!({ "type": "movie", "name": "A" }),
            json!({ "type": "movie", "name": "B" }),
            json!({ "type": "movie", "name": "C" }),
            json!({ "type": "movie", "name": "D" }),
        ];
        let map = align_by_index(&names, &long);
        assert_eq!(map.len(), 3);
        assert_eq!(map["c.mkv"].name, "C");
    }

    #[test]
    fn test_auth_is_fatal() {
        assert!(ClassifyError::Auth("401".into()).is_fatal());
        assert!(!ClassifyError::Transport("reset".into()).is_fatal());
    }
}
