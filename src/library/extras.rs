//! # 花絮检测
//!
//! 按以下顺序判断文件是否为附加内容（花絮、预告、删减片段等）：
//! 1. 文件名含 `SxxEyy` 集数模式 → 一定不是花絮
//! 2. 文件名关键字
//! 3. 上级目录名（extras / featurettes / ...）
//! 4. 时长小于 5 分钟
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 调用
//! - 使用 `regex`

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// 短片阈值（秒）
pub const SHORT_DURATION_SECS: f64 = 300.0;

/// 文件名关键字 → 花絮类型（按优先级排列）
const EXTRA_KEYWORDS: &[(&str, &str)] = &[
    ("behind the scenes", "Behind the Scenes"),
    ("featurette", "Featurette"),
    ("deleted scene", "Deleted Scene"),
    ("interview", "Interview"),
    ("bloopers", "Bloopers"),
    ("trailer", "Trailer"),
    ("recap", "Recap"),
    ("preview", "Preview"),
    ("promo", "Promo"),
    ("gag reel", "Gag Reel"),
    ("making of", "Making Of"),
    ("outtakes", "Outtakes"),
    ("music video", "Music Video"),
    ("webisode", "Webisode"),
    ("mini-episode", "Mini-Episode"),
    ("newsreel", "Newsreels"),
];

/// 花絮目录名
const EXTRA_FOLDERS: &[&str] = &[
    "extras",
    "bonus",
    "behind the scenes",
    "featurettes",
    "newsreels",
    "deleted scenes",
    "trailers",
];

/// 检测依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    Keyword,
    Location,
    Duration,
}

/// 花絮检测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraInfo {
    /// 花絮类型，如 "Featurette"
    pub extra_type: String,
    pub method: DetectionMethod,
}

fn episode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)S\d{1,2}E\d{1,3}").expect("valid episode regex"))
}

/// 文件名中是否含有集数模式
pub fn has_episode_pattern(filename: &str) -> bool {
    episode_pattern().is_match(filename)
}

/// 判断文件是否为花絮
///
/// `relative_path` 为相对源目录的路径，只检查源目录以下的目录名。
pub fn classify_extra(relative_path: &Path, duration: Option<f64>) -> Option<ExtraInfo> {
    let filename = relative_path.file_name()?.to_string_lossy();
    if has_episode_pattern(&filename) {
        return None;
    }

    // 分隔符统一为空格后再匹配关键字
    let normalised = filename.to_lowercase().replace(['.', '_'], " ");
    if let Some((_, extra_type)) = EXTRA_KEYWORDS
        .iter()
        .find(|(keyword, _)| normalised.contains(keyword))
    {
        return Some(ExtraInfo {
            extra_type: extra_type.to_string(),
            method: DetectionMethod::Keyword,
        });
    }

    if let Some(parent) = relative_path.parent() {
        for component in parent.components().rev() {
            let name = component.as_os_str().to_string_lossy().to_lowercase();
            if EXTRA_FOLDERS.contains(&name.as_str()) {
                return Some(ExtraInfo {
                    extra_type: title_case(&name),
                    method: DetectionMethod::Location,
                });
            }
        }
    }

    match duration {
        Some(d) if d > 0.0 && d < SHORT_DURATION_SECS => Some(ExtraInfo {
            extra_type: "Short".to_string(),
            method: DetectionMethod::Duration,
        }),
        _ => None,
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_is_never_extra() {
        let path = Path::new("Extras/Show.S01E01.Featurette.mkv");
        assert_eq!(classify_extra(path, Some(60.0)), None);
    }

    #[test]
    fn test_keyword_detection() {
        let info = classify_extra(Path::new("Show.Behind.The.Scenes.mkv"), Some(1800.0)).unwrap();
        assert_eq!(info.extra_type, "Behind the Scenes");
        assert_eq!(info.method, DetectionMethod::Keyword);

        let info = classify_extra(Path::new("movie_trailer.mp4"), None).unwrap();
        assert_eq!(info.extra_type, "Trailer");
    }

    #[test]
    fn test_location_detection() {
        let info = classify_extra(Path::new("Show/Bonus/clip one.mkv"), Some(1200.0)).unwrap();
        assert_eq!(info.extra_type, "Bonus");
        assert_eq!(info.method, DetectionMethod::Location);

        let info = classify_extra(Path::new("Show/Deleted Scenes/a.mkv"), None).unwrap();
        assert_eq!(info.extra_type, "Deleted Scenes");
    }

    #[test]
    fn test_duration_detection() {
        let info = classify_extra(Path::new("clip.mkv"), Some(120.0)).unwrap();
        assert_eq!(info.extra_type, "Short");
        assert_eq!(info.method, DetectionMethod::Duration);

        assert_eq!(classify_extra(Path::new("film.mkv"), Some(5400.0)), None);
        assert_eq!(classify_extra(Path::new("film.mkv"), None), None);
        assert_eq!(classify_extra(Path::new("film.mkv"), Some(0.0)), None);
    }
}
