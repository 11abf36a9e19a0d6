//! # 分类结果数据模型
//!
//! 外部分类服务对单个文件名的识别结果。
//!
//! ## 依赖关系
//! - 被 `classify/` 生成
//! - 被 `library/layout.rs`, `batch/pipeline.rs` 使用

use serde::{Deserialize, Serialize};

/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    TvEpisode,
    Movie,
    #[default]
    Unknown,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::TvEpisode => write!(f, "tv-episode"),
            MediaType::Movie => write!(f, "movie"),
            MediaType::Unknown => write!(f, "unknown"),
        }
    }
}

/// 单个文件名的识别结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Identification {
    /// 媒体类型
    pub media_type: MediaType,

    /// 剧集名或电影名
    pub name: String,

    /// 年份（电影）
    pub year: Option<u32>,

    /// 季号（剧集）
    pub season: Option<u32>,

    /// 集号（剧集）
    pub episode: Option<u32>,

    /// 单集标题
    pub episode_title: Option<String>,

    /// 是否特别篇 (S00)
    pub is_special: bool,

    /// 置信度 0..=1
    pub confidence: f32,
}

impl Identification {
    /// 无法识别
    pub fn unknown() -> Self {
        Identification::default()
    }

    pub fn movie(name: impl Into<String>, year: Option<u32>) -> Self {
        Identification {
            media_type: MediaType::Movie,
            name: name.into(),
            year,
            confidence: 1.0,
            ..Default::default()
        }
    }

    pub fn episode(name: impl Into<String>, season: u32, episode: u32) -> Self {
        Identification {
            media_type: MediaType::TvEpisode,
            name: name.into(),
            season: Some(season),
            episode: Some(episode),
            confidence: 1.0,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.episode_title = Some(title.into());
        self
    }

    /// 名称为空的识别结果视为无法识别
    pub fn is_known(&self) -> bool {
        self.media_type != MediaType::Unknown && !self.name.trim().is_empty()
    }

    /// 人类可读的集数描述
    pub fn episode_info(&self) -> String {
        match self.media_type {
            MediaType::Movie => match self.year {
                Some(year) => format!("Movie ({})", year),
                None => "Movie".to_string(),
            },
            MediaType::TvEpisode => {
                let season = self.season.unwrap_or(1);
                let episode = self.episode.unwrap_or(1);
                if self.is_special {
                    return format!("Special S00E{:02}", episode);
                }
                let mut info = format!("Season {} Episode {}", season, episode);
                if let Some(title) = self.episode_title.as_deref().filter(|t| !t.is_empty()) {
                    info.push_str(" - ");
                    info.push_str(title);
                }
                info
            }
            MediaType::Unknown => "Unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_info() {
        let ep = Identification::episode("The Bear", 1, 1).with_title("System");
        assert_eq!(ep.episode_info(), "Season 1 Episode 1 - System");

        let movie = Identification::movie("Heat", Some(1995));
        assert_eq!(movie.episode_info(), "Movie (1995)");

        let mut special = Identification::episode("Doctor Who", 0, 3);
        special.is_special = true;
        assert_eq!(special.episode_info(), "Special S00E03");

        assert_eq!(Identification::unknown().episode_info(), "Unknown");
    }

    #[test]
    fn test_is_known() {
        assert!(!Identification::unknown().is_known());
        assert!(!Identification::movie("  ", None).is_known());
        assert!(Identification::movie("Heat", None).is_known());
    }

    #[test]
    fn test_media_type_serde() {
        let json = serde_json::to_string(&MediaType::TvEpisode).unwrap();
        assert_eq!(json, "\"tv-episode\"");
        assert_eq!(MediaType::Movie.to_string(), "movie");
    }
}
