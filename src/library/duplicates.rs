//! # 重复文件裁决
//!
//! 多个候选文件映射到同一目标路径时，只保留一个，其余标记为跳过。
//!
//! ## 裁决顺序
//! 1. 质量评分高者胜出
//! 2. 质量相同时文件更大者胜出（大小未知视为最小）
//! 3. 仍相同时原路径字典序更小者胜出
//!
//! 只修改结果标记，不做任何文件系统操作。
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 调用
//! - 使用 `models/result.rs`

use crate::models::ProcessingResult;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

/// 比较两个候选；`Ordering::Greater` 表示 `a` 应被保留
pub fn compare_candidates(a: &ProcessingResult, b: &ProcessingResult) -> Ordering {
    a.quality()
        .cmp(&b.quality())
        .then_with(|| a.file_size().cmp(&b.file_size()))
        .then_with(|| b.original_path.cmp(&a.original_path))
}

/// 在候选下标中选出胜者；空组返回 None
pub fn pick_winner(results: &[ProcessingResult], group: &[usize]) -> Option<usize> {
    group
        .iter()
        .copied()
        .max_by(|&a, &b| compare_candidates(&results[a], &results[b]))
}

/// 按目标路径分组并裁决，返回被跳过的数量
pub fn resolve_duplicates(results: &mut [ProcessingResult]) -> usize {
    let mut groups: HashMap<PathBuf, Vec<usize>> = HashMap::new();
    for (idx, result) in results.iter().enumerate() {
        if !result.is_actionable() {
            continue;
        }
        if let Some(dest) = &result.new_path {
            groups.entry(dest.clone()).or_default().push(idx);
        }
    }

    let mut skipped = 0;
    for group in groups.values().filter(|g| g.len() > 1) {
        let Some(winner) = pick_winner(results, group) else {
            continue;
        };
        let winner_path = results[winner].original_path.display().to_string();
        for &idx in group.iter().filter(|&&idx| idx != winner) {
            tracing::debug!(
                loser = %results[idx].original_path.display(),
                winner = %winner_path,
                "duplicate destination"
            );
            results[idx].mark_skipped(format!("duplicate of {}", winner_path));
            skipped += 1;
        }
    }
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileMetadata;
    use std::path::Path;

    fn candidate(path: &str, quality: u32, size: Option<u64>, dest: &str) -> ProcessingResult {
        let meta = FileMetadata {
            path: PathBuf::from(path),
            duration: Some(1200.0),
            quality,
            playable: true,
            width: None,
            height: None,
            file_size: size,
            codec: None,
            bit_rate: None,
            error: None,
        };
        let mut result = ProcessingResult::new(meta);
        result.new_path = Some(PathBuf::from(dest));
        result
    }

    #[test]
    fn test_higher_quality_wins() {
        let mut results = vec![
            candidate("/src/a-480p.mkv", 1, Some(9_000), "/lib/x.mkv"),
            candidate("/src/b-1080p.mkv", 3, Some(1_000), "/lib/x.mkv"),
        ];
        assert_eq!(resolve_duplicates(&mut results), 1);
        assert!(results[0].skipped);
        assert!(results[0].new_path.is_none());
        assert!(!results[1].skipped);
        assert_eq!(results[1].new_path.as_deref(), Some(Path::new("/lib/x.mkv")));
    }

    #[test]
    fn test_equal_quality_larger_file_wins() {
        let mut results = vec![
            candidate("/src/a.mkv", 3, Some(2_000), "/lib/x.mkv"),
            candidate("/src/b.mkv", 3, Some(5_000), "/lib/x.mkv"),
            candidate("/src/c.mkv", 3, None, "/lib/x.mkv"),
        ];
        assert_eq!(resolve_duplicates(&mut results), 2);
        assert!(results[0].skipped);
        assert!(!results[1].skipped);
        assert!(results[2].skipped);
    }

    #[test]
    fn test_full_tie_smaller_path_wins() {
        let mut results = vec![
            candidate("/src/z.mkv", 2, Some(100), "/lib/x.mkv"),
            candidate("/src/a.mkv", 2, Some(100), "/lib/x.mkv"),
        ];
        resolve_duplicates(&mut results);
        assert!(results[0].skipped);
        assert!(!results[1].skipped);
        assert_eq!(
            results[0].skip_reason.as_deref(),
            Some("duplicate of /src/a.mkv")
        );
    }

    #[test]
    fn test_singletons_and_empty() {
        let mut empty: Vec<ProcessingResult> = Vec::new();
        assert_eq!(resolve_duplicates(&mut empty), 0);
        assert_eq!(pick_winner(&empty, &[]), None);

        let mut results = vec![
            candidate("/src/a.mkv", 0, None, "/lib/a.mkv"),
            candidate("/src/b.mkv", 0, None, "/lib/b.mkv"),
        ];
        assert_eq!(resolve_duplicates(&mut results), 0);
        assert!(results.iter().all(|r| !r.skipped));
    }

    #[test]
    fn test_failed_results_do_not_compete() {
        let mut results = vec![
            candidate("/src/a.mkv", 4, Some(10), "/lib/x.mkv"),
            candidate("/src/b.mkv", 1, Some(10), "/lib/x.mkv"),
        ];
        results[0].mark_failed("classification failed");
        assert_eq!(resolve_duplicates(&mut results), 0);
        assert!(!results[1].skipped);
    }
}
