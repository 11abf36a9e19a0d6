//! # 源目录清理
//!
//! 实际运行结束后删除源目录下变空的子目录（自底向上），
//! 名称在保留列表中的目录及源根目录本身不删除。
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 调用
//! - 使用 `walkdir` 自底向上遍历

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// 删除 `root` 下的空目录，返回删除的数量；单个目录删除失败只记录警告
pub fn remove_empty_dirs(root: &Path, preserve: &[&str]) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let name = entry.file_name().to_string_lossy();
        if preserve.iter().any(|p| *p == name) {
            continue;
        }
        let path = entry.path();
        let is_empty = fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }
        match fs::remove_dir(path) {
            Ok(()) => {
                tracing::debug!(dir = %path.display(), "removed empty directory");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "failed to remove empty directory")
            }
        }
    }
    removed
}
