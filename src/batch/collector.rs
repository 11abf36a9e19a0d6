//! # 文件收集器
//!
//! 枚举源目录下的视频文件，得到确定顺序的发现列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（大小写不敏感）
//! - 递归目录搜索，按路径排序
//! - 默认跳过隐藏文件（如 macOS 的 `._*` 资源分叉文件）
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认视频扩展名
pub const VIDEO_PATTERNS: &str = "*.mp4,*.mkv,*.avi,*.mov,*.webm,*.flv,*.m4v,*.wmv,*.ts";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
    /// 是否包含隐藏文件
    include_hidden: bool,
}

impl FileCollector {
    /// 创建新的文件收集器（默认匹配视频扩展名、递归）
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: parse_patterns(VIDEO_PATTERNS),
            recursive: true,
            include_hidden: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = parse_patterns(pattern);
        if self.patterns.is_empty() {
            self.patterns = parse_patterns("*");
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 设置是否包含隐藏文件
    pub fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.input)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// 检查文件是否匹配任一模式
    fn matches(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        if !self.include_hidden && filename.starts_with('.') {
            return false;
        }

        self.patterns
            .iter()
            .any(|p| p.matches_with(filename, MATCH_OPTIONS))
    }
}

fn parse_patterns(pattern: &str) -> Vec<Pattern> {
    pattern
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Pattern::new(s) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(pattern = s, error = %e, "ignoring invalid pattern");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collects_videos_sorted_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/season 1")).unwrap();
        fs::write(root.join("b/season 1/ep2.MKV"), b"").unwrap();
        fs::write(root.join("b/season 1/ep1.mkv"), b"").unwrap();
        fs::write(root.join("a.mp4"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::write(root.join("._a.mp4"), b"").unwrap();

        let files = FileCollector::new(root.to_path_buf()).collect();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.mp4"),
                PathBuf::from("b/season 1/ep1.mkv"),
                PathBuf::from("b/season 1/ep2.MKV"),
            ]
        );
    }

    #[test]
    fn test_non_recursive_and_custom_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/deep.mkv"), b"").unwrap();
        fs::write(root.join("top.avi"), b"").unwrap();
        fs::write(root.join("top.mkv"), b"").unwrap();

        let files = FileCollector::new(root.to_path_buf())
            .with_pattern("*.avi")
            .recursive(false)
            .collect();
        assert_eq!(files, vec![root.join("top.avi")]);
    }

    #[test]
    fn test_single_file_and_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.mkv");
        fs::write(&file, b"").unwrap();
        assert_eq!(FileCollector::new(file.clone()).collect(), vec![file]);
        assert!(FileCollector::new(dir.path().join("missing")).collect().is_empty());
    }
}
