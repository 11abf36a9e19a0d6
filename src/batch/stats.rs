//! # 运行统计
//!
//! 协调线程独占的统计结构，每个批次结束后更新一次，不跨线程共享。
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 更新
//! - 被 `commands/organise.rs` 展示

use crate::models::ProcessingResult;

use serde::Serialize;
use std::time::Duration;

/// 运行统计快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// 已处理文件数（含出错与跳过）
    pub files_processed: usize,
    /// 总耗时
    pub total_time: Duration,
    /// 探测调用次数
    pub probe_calls: usize,
    /// 带错误的文件数
    pub errors: usize,
    /// 跳过的文件数
    pub skipped: usize,
    /// 既未出错也未跳过的文件数
    pub succeeded: usize,
    /// 实际完成的移动数（dry-run 恒为 0）
    pub moved: usize,
    /// 已完成批次数
    pub batches: usize,
    /// 是否在批次边界被取消
    pub cancelled: bool,
}

impl RunStats {
    /// 合并一个批次的结果
    pub fn record_batch(&mut self, results: &[ProcessingResult], probe_calls: usize, moved: usize) {
        self.batches += 1;
        self.files_processed += results.len();
        self.probe_calls += probe_calls;
        self.moved += moved;
        self.errors += results.iter().filter(|r| r.error.is_some()).count();
        self.skipped += results.iter().filter(|r| r.skipped).count();
        self.succeeded += results
            .iter()
            .filter(|r| r.error.is_none() && !r.skipped)
            .count();
    }

    /// 之前批次中 `displaced` 个成功结果被更优的重复文件取代，其中 `reversed` 个已移回原处
    pub fn record_displaced(&mut self, displaced: usize, reversed: usize) {
        self.succeeded = self.succeeded.saturating_sub(displaced);
        self.skipped += displaced;
        self.moved = self.moved.saturating_sub(reversed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileMetadata;

    fn result(error: bool, skipped: bool) -> ProcessingResult {
        let mut r = ProcessingResult::new(FileMetadata::failed("/a.mkv", "x"));
        if error {
            r.mark_failed("boom");
        }
        if skipped {
            r.mark_skipped("dup");
        }
        r
    }

    #[test]
    fn test_record_batch_accumulates() {
        let mut stats = RunStats::default();
        stats.record_batch(&[result(false, false), result(true, false)], 2, 1);
        stats.record_batch(&[result(false, true)], 1, 0);

        assert_eq!(stats.batches, 2);
        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.probe_calls, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.succeeded, 1);

        // 未识别的文件同时出错且跳过，不计入成功
        stats.record_batch(&[result(true, true)], 1, 0);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.succeeded, 1);
    }

    #[test]
    fn test_record_displaced_moves_success_to_skipped() {
        let mut stats = RunStats::default();
        stats.record_batch(&[result(false, false)], 1, 1);
        stats.record_batch(&[result(false, false)], 1, 1);
        stats.record_displaced(1, 1);

        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.moved, 1);
    }
}
