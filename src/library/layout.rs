//! # 媒体库目录布局
//!
//! 由识别结果计算目标相对路径。dry-run 与实际运行调用同一个函数，
//! 因此预览结果与实际移动位置完全一致。
//!
//! ## 布局
//! ```text
//! Movies/<Name> (<Year>)/<Name> (<Year>).<ext>
//! Movies/<Name> (<Year>)/Extras/<Type> - <stem>.<ext>
//! TV Shows/<Show>/Season NN/<Show> - SNNEMM[ - <Title>].<ext>
//! TV Shows/<Show>/Season NN/Extras/<Show> - SNN - <Type> - <stem>.<ext>
//! TV Shows/<Show>/Extras/<Show> - <Type> - <stem>.<ext>
//! TV Shows/<Show>/Specials/<Show> - S00EMM.<ext>
//! ```
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 调用
//! - 使用 `library/extras.rs`, `models/identification.rs`

use super::extras::ExtraInfo;
use crate::models::{Identification, MediaType};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const MOVIES_DIR: &str = "Movies";
pub const TV_DIR: &str = "TV Shows";
pub const EXTRAS_DIR: &str = "Extras";
pub const SPECIALS_DIR: &str = "Specials";

fn forbidden_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[<>:"|?*/\\]"#).expect("valid filename regex"))
}

/// 替换文件名中的非法字符，去除首尾空白与结尾的点
pub fn clean_filename(name: &str) -> String {
    forbidden_chars()
        .replace_all(name, "-")
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// 计算目标相对路径；无法确定位置时返回 None
pub fn relative_destination(
    ident: &Identification,
    extra: Option<&ExtraInfo>,
    original: &Path,
) -> Option<PathBuf> {
    let name = clean_filename(&ident.name);
    if name.is_empty() {
        return None;
    }

    let ext = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stem = original
        .file_stem()
        .map(|s| clean_filename(&s.to_string_lossy()))
        .unwrap_or_default();

    match ident.media_type {
        MediaType::Movie => {
            let folder = match ident.year {
                Some(year) => format!("{} ({})", name, year),
                None => name,
            };
            let base = Path::new(MOVIES_DIR).join(&folder);
            match extra {
                Some(extra) => Some(base.join(EXTRAS_DIR).join(format!(
                    "{} - {}{}",
                    clean_filename(&extra.extra_type),
                    stem,
                    ext
                ))),
                None => Some(base.join(format!("{}{}", folder, ext))),
            }
        }
        MediaType::TvEpisode => {
            let show_dir = Path::new(TV_DIR).join(&name);

            if let Some(extra) = extra {
                let extra_type = clean_filename(&extra.extra_type);
                return Some(match ident.season.filter(|s| *s > 0) {
                    Some(season) => show_dir
                        .join(format!("Season {:02}", season))
                        .join(EXTRAS_DIR)
                        .join(format!(
                            "{} - S{:02} - {} - {}{}",
                            name, season, extra_type, stem, ext
                        )),
                    None => show_dir
                        .join(EXTRAS_DIR)
                        .join(format!("{} - {} - {}{}", name, extra_type, stem, ext)),
                });
            }

            let episode = ident.episode?;
            if ident.is_special || ident.season == Some(0) {
                return Some(
                    show_dir
                        .join(SPECIALS_DIR)
                        .join(format!("{} - S00E{:02}{}", name, episode, ext)),
                );
            }

            let season = ident.season.unwrap_or(1);
            let title = ident
                .episode_title
                .as_deref()
                .map(clean_filename)
                .filter(|t| !t.is_empty())
                .map(|t| format!(" - {}", t))
                .unwrap_or_default();
            Some(show_dir.join(format!("Season {:02}", season)).join(format!(
                "{} - S{:02}E{:02}{}{}",
                name, season, episode, title, ext
            )))
        }
        MediaType::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::extras::DetectionMethod;

    fn extra(kind: &str) -> ExtraInfo {
        ExtraInfo {
            extra_type: kind.to_string(),
            method: DetectionMethod::Keyword,
        }
    }

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("bad:name?*"), "bad-name--");
        assert_eq!(clean_filename("  Mr. Robot. "), "Mr. Robot");
        assert_eq!(clean_filename("AC/DC"), "AC-DC");
    }

    #[test]
    fn test_movie_destination() {
        let ident = Identification::movie("Heat", Some(1995));
        let dest = relative_destination(&ident, None, Path::new("/in/Heat.1995.mkv")).unwrap();
        assert_eq!(dest, Path::new("Movies/Heat (1995)/Heat (1995).mkv"));

        let ident = Identification::movie("Alien", None);
        let dest = relative_destination(&ident, None, Path::new("alien.mp4")).unwrap();
        assert_eq!(dest, Path::new("Movies/Alien/Alien.mp4"));
    }

    #[test]
    fn test_episode_destination() {
        let ident = Identification::episode("The Bear", 1, 1).with_title("System");
        let dest = relative_destination(&ident, None, Path::new("bear.s01e01.mkv")).unwrap();
        assert_eq!(
            dest,
            Path::new("TV Shows/The Bear/Season 01/The Bear - S01E01 - System.mkv")
        );
    }

    #[test]
    fn test_episode_without_number_is_unresolved() {
        let mut ident = Identification::episode("The Bear", 1, 1);
        ident.episode = None;
        assert_eq!(relative_destination(&ident, None, Path::new("x.mkv")), None);
    }

    #[test]
    fn test_special_destination() {
        let mut ident = Identification::episode("Doctor Who", 0, 4);
        ident.is_special = true;
        let dest = relative_destination(&ident, None, Path::new("dw.mkv")).unwrap();
        assert_eq!(dest, Path::new("TV Shows/Doctor Who/Specials/Doctor Who - S00E04.mkv"));
    }

    #[test]
    fn test_extra_destinations() {
        let ident = Identification::episode("The Bear", 2, 1);
        let dest = relative_destination(&ident, Some(&extra("Featurette")), Path::new("making.mkv"))
            .unwrap();
        assert_eq!(
            dest,
            Path::new("TV Shows/The Bear/Season 02/Extras/The Bear - S02 - Featurette - making.mkv")
        );

        let mut no_season = ident.clone();
        no_season.season = None;
        let dest =
            relative_destination(&no_season, Some(&extra("Trailer")), Path::new("t.mkv")).unwrap();
        assert_eq!(dest, Path::new("TV Shows/The Bear/Extras/The Bear - Trailer - t.mkv"));

        let movie = Identification::movie("Heat", Some(1995));
        let dest = relative_destination(&movie, Some(&extra("Trailer")), Path::new("heat-tr.mp4"))
            .unwrap();
        assert_eq!(dest, Path::new("Movies/Heat (1995)/Extras/Trailer - heat-tr.mp4"));
    }

    #[test]
    fn test_unknown_has_no_destination() {
        let ident = Identification::unknown();
        assert_eq!(relative_destination(&ident, None, Path::new("x.mkv")), None);
    }
}
