//! # 文件元数据模型
//!
//! 单次 ffprobe 调用得到的技术元数据，以及质量评分规则。
//!
//! ## 质量评分
//! 有序整数，数值越大越好：
//! - `0` 低于 480 线
//! - `1` 480p / SD
//! - `2` 720p
//! - `3` 1080p
//! - `4` 2160p 及以上
//!
//! 探测失败时按文件大小映射到同一刻度，保证去重时仍可比较。
//!
//! ## 依赖关系
//! - 被 `probe/`, `library/duplicates.rs`, `batch/pipeline.rs` 使用

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const QUALITY_UNKNOWN: u32 = 0;
pub const QUALITY_SD: u32 = 1;
pub const QUALITY_HD: u32 = 2;
pub const QUALITY_FULL_HD: u32 = 3;
pub const QUALITY_UHD: u32 = 4;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// 单个源文件的技术元数据（创建后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// 源文件路径（唯一键）
    pub path: PathBuf,

    /// 时长（秒），未知为 None
    pub duration: Option<f64>,

    /// 质量评分
    pub quality: u32,

    /// 是否可播放（时长 > 0）
    pub playable: bool,

    /// 视频流宽度（仅在找到视频流时存在）
    pub width: Option<u32>,

    /// 视频流高度
    pub height: Option<u32>,

    /// 文件大小（字节）
    pub file_size: Option<u64>,

    /// 视频编码
    pub codec: Option<String>,

    /// 码率 (bit/s)
    pub bit_rate: Option<u64>,

    /// 提取失败原因
    pub error: Option<String>,
}

impl FileMetadata {
    /// 探测失败时的降级元数据：无时长，质量取文件大小代理值
    pub fn failed(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        let path = path.into();
        let file_size = size_on_disk(&path);
        FileMetadata {
            quality: file_size.map(quality_from_size).unwrap_or(QUALITY_UNKNOWN),
            path,
            duration: None,
            playable: false,
            width: None,
            height: None,
            file_size,
            codec: None,
            bit_rate: None,
            error: Some(error.into()),
        }
    }

    /// 探测是否成功
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// 分辨率字符串，如 "1920x1080"
    pub fn resolution(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// 读取文件系统中的文件大小
pub fn size_on_disk(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// 由视频流尺寸计算质量等级（取高度等级与宽度等级中的较大者）
pub fn quality_from_dimensions(width: u32, height: u32) -> u32 {
    let by_height = match height {
        h if h >= 2160 => QUALITY_UHD,
        h if h >= 1080 => QUALITY_FULL_HD,
        h if h >= 720 => QUALITY_HD,
        h if h >= 480 => QUALITY_SD,
        _ => QUALITY_UNKNOWN,
    };
    // 宽银幕片源高度偏小，按宽度再评一次
    let by_width = match width {
        w if w >= 3840 => QUALITY_UHD,
        w if w >= 1920 => QUALITY_FULL_HD,
        w if w >= 1280 => QUALITY_HD,
        w if w >= 640 => QUALITY_SD,
        _ => QUALITY_UNKNOWN,
    };
    by_height.max(by_width)
}

/// 由文件大小估算质量等级
pub fn quality_from_size(bytes: u64) -> u32 {
    match bytes {
        b if b >= 8 * GIB => QUALITY_UHD,
        b if b >= 2 * GIB => QUALITY_FULL_HD,
        b if b >= 700 * MIB => QUALITY_HD,
        b if b >= 200 * MIB => QUALITY_SD,
        _ => QUALITY_UNKNOWN,
    }
}

/// 质量等级的显示名称
pub fn quality_label(quality: u32) -> &'static str {
    match quality {
        QUALITY_UHD => "2160p",
        QUALITY_FULL_HD => "1080p",
        QUALITY_HD => "720p",
        QUALITY_SD => "480p",
        _ => "low",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_dimensions() {
        assert_eq!(quality_from_dimensions(1920, 1080), QUALITY_FULL_HD);
        assert_eq!(quality_from_dimensions(854, 480), QUALITY_SD);
        assert_eq!(quality_from_dimensions(1280, 720), QUALITY_HD);
        assert_eq!(quality_from_dimensions(3840, 2160), QUALITY_UHD);
        assert_eq!(quality_from_dimensions(320, 240), QUALITY_UNKNOWN);
        // 2.40:1 scope
        assert_eq!(quality_from_dimensions(1920, 800), QUALITY_FULL_HD);
    }

    #[test]
    fn test_quality_from_size() {
        assert_eq!(quality_from_size(0), QUALITY_UNKNOWN);
        assert_eq!(quality_from_size(350 * MIB), QUALITY_SD);
        assert_eq!(quality_from_size(1 * GIB), QUALITY_HD);
        assert_eq!(quality_from_size(4 * GIB), QUALITY_FULL_HD);
        assert_eq!(quality_from_size(20 * GIB), QUALITY_UHD);
    }

    #[test]
    fn test_failed_metadata_uses_size_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mkv");
        fs::write(&path, vec![0u8; 1024]).unwrap();

        let meta = FileMetadata::failed(&path, "timeout");
        assert_eq!(meta.error.as_deref(), Some("timeout"));
        assert_eq!(meta.duration, None);
        assert!(!meta.playable);
        assert_eq!(meta.file_size, Some(1024));
        assert_eq!(meta.quality, QUALITY_UNKNOWN);
        assert!(!meta.is_ok());
    }

    #[test]
    fn test_failed_metadata_missing_file() {
        let meta = FileMetadata::failed("/definitely/not/here.mkv", "missing");
        assert_eq!(meta.file_size, None);
        assert_eq!(meta.quality, QUALITY_UNKNOWN);
    }
}
