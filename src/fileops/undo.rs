//! # 撤销
//!
//! 按时间倒序（最新的先）重放操作日志，把文件移回原位置。
//! 成功撤销的条目从日志中移除，失败的保留以便再次尝试。
//! dry-run 在内存中模拟每一步的结果，同一文件被移动多次时判定与实际撤销一致。
//!
//! ## 依赖关系
//! - 被 `commands/undo.rs` 调用
//! - 使用 `fileops/oplog.rs`, `fileops/executor.rs`, `fileops/hash.rs`

use super::executor::{ensure_directory, move_file};
use super::hash::sha256_file;
use super::oplog::{read_entries, rewrite_entries, LogEntry};
use crate::error::Result;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// 撤销结果统计
#[derive(Debug, Default)]
pub struct UndoReport {
    /// 已恢复（dry-run 时为可恢复）的条目，按撤销顺序
    pub restored: Vec<LogEntry>,
    /// 失败条目及原因，按撤销顺序
    pub failed: Vec<(LogEntry, String)>,
}

impl UndoReport {
    pub fn total(&self) -> usize {
        self.restored.len() + self.failed.len()
    }
}

/// 撤销日志中的全部操作
///
/// `verify` 为真时，移回前校验当前文件哈希与日志记录一致。
pub fn undo_log(log_path: &Path, dry_run: bool, verify: bool) -> Result<UndoReport> {
    let entries = read_entries(log_path)?;
    let mut report = UndoReport::default();
    let mut view = SimulatedView::default();

    for entry in entries.iter().rev() {
        match undo_entry(entry, dry_run, verify, &mut view) {
            Ok(()) => report.restored.push(entry.clone()),
            Err(reason) => {
                tracing::warn!(file = %entry.new.display(), %reason, "undo failed");
                report.failed.push((entry.clone(), reason));
            }
        }
    }

    if !dry_run {
        // 保留失败条目，恢复为时间正序
        let remaining: Vec<LogEntry> = report
            .failed
            .iter()
            .rev()
            .map(|(entry, _)| entry.clone())
            .collect();
        rewrite_entries(log_path, &remaining)?;
    }

    Ok(report)
}

/// dry-run 中已模拟撤销的条目对文件位置的影响
///
/// 实际撤销时保持为空，所有判断直接反映文件系统。
#[derive(Debug, Default)]
struct SimulatedView {
    /// 模拟中被移走的路径
    vacated: HashSet<PathBuf>,
    /// 模拟中的路径 → 文件实际所在的路径
    occupied: HashMap<PathBuf, PathBuf>,
}

impl SimulatedView {
    /// 文件在模拟视图中位于 `path` 时返回其实际路径
    fn locate(&self, path: &Path) -> Option<PathBuf> {
        if let Some(actual) = self.occupied.get(path) {
            return Some(actual.clone());
        }
        (!self.vacated.contains(path) && path.exists()).then(|| path.to_path_buf())
    }

    fn record(&mut self, entry: &LogEntry, actual: PathBuf) {
        self.occupied.remove(&entry.new);
        self.vacated.insert(entry.new.clone());
        self.vacated.remove(&entry.original);
        self.occupied.insert(entry.original.clone(), actual);
    }
}

fn undo_entry(
    entry: &LogEntry,
    dry_run: bool,
    verify: bool,
    view: &mut SimulatedView,
) -> std::result::Result<(), String> {
    let Some(current) = view.locate(&entry.new) else {
        return Err(format!("moved file is missing: {}", entry.new.display()));
    };
    if view.locate(&entry.original).is_some() {
        return Err(format!(
            "original location is occupied: {}",
            entry.original.display()
        ));
    }
    if verify {
        let hash = sha256_file(&current).map_err(|e| format!("failed to hash: {}", e))?;
        if hash != entry.hash {
            return Err("content changed since it was moved".to_string());
        }
    }
    if dry_run {
        view.record(entry, current);
        return Ok(());
    }

    if let Some(parent) = entry.original.parent() {
        ensure_directory(parent).map_err(|e| e.to_string())?;
    }
    let expected = verify.then_some(entry.hash.as_str());
    move_file(&entry.new, &entry.original, expected).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileops::oplog::OperationLog;
    use std::fs;

    /// 模拟两次连续移动：a → b，然后 b → c（同一文件被移动两次）
    #[test]
    fn test_undo_replays_in_reverse_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("src").join("a.mkv");
        let b = dir.path().join("stage").join("b.mkv");
        let c = dir.path().join("lib").join("c.mkv");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::write(&a, b"payload").unwrap();
        let hash = sha256_file(&a).unwrap();

        ensure_directory(b.parent().unwrap()).unwrap();
        move_file(&a, &b, None).unwrap();
        ensure_directory(c.parent().unwrap()).unwrap();
        move_file(&b, &c, None).unwrap();

        let log_path = dir.path().join("ops.jsonl");
        let mut log = OperationLog::open(&log_path).unwrap();
        log.append(&[
            LogEntry::new(a.clone(), b.clone(), hash.clone()),
            LogEntry::new(b.clone(), c.clone(), hash.clone()),
        ])
        .unwrap();
        drop(log);

        // 正序重放会失败，倒序才能回到 a
        let report = undo_log(&log_path, false, true).unwrap();
        assert_eq!(report.restored.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.restored[0].new, c);
        assert_eq!(report.restored[1].new, b);
        assert!(a.exists());
        assert!(!b.exists());
        assert!(!c.exists());
        assert!(!log_path.exists());
    }

    #[test]
    fn test_undo_dry_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let orig = dir.path().join("a.mkv");
        let moved = dir.path().join("b.mkv");
        fs::write(&moved, b"x").unwrap();

        let log_path = dir.path().join("ops.jsonl");
        let mut log = OperationLog::open(&log_path).unwrap();
        log.append(&[LogEntry::new(orig.clone(), moved.clone(), "h".into())])
            .unwrap();
        drop(log);

        let report = undo_log(&log_path, true, false).unwrap();
        assert_eq!(report.restored.len(), 1);
        assert!(moved.exists());
        assert!(!orig.exists());
        assert_eq!(read_entries(&log_path).unwrap().len(), 1);
    }

    #[test]
    fn test_dry_run_follows_chained_moves() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("src").join("a.mkv");
        let b = dir.path().join("stage").join("b.mkv");
        let c = dir.path().join("lib").join("c.mkv");
        fs::create_dir_all(c.parent().unwrap()).unwrap();
        fs::write(&c, b"payload").unwrap();
        let hash = sha256_file(&c).unwrap();

        let log_path = dir.path().join("ops.jsonl");
        let mut log = OperationLog::open(&log_path).unwrap();
        log.append(&[
            LogEntry::new(a.clone(), b.clone(), hash.clone()),
            LogEntry::new(b.clone(), c.clone(), hash.clone()),
        ])
        .unwrap();
        drop(log);

        let preview = undo_log(&log_path, true, true).unwrap();
        assert_eq!(preview.restored.len(), 2);
        assert!(preview.failed.is_empty(), "{:?}", preview.failed);
        assert!(c.exists());
        assert!(!a.exists());
        assert!(!b.exists());

        // 实际撤销与预览一致
        let report = undo_log(&log_path, false, true).unwrap();
        assert_eq!(report.restored.len(), 2);
        assert!(a.exists());
    }

    #[test]
    fn test_dry_run_reports_occupied_original() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mkv");
        let b = dir.path().join("b.mkv");
        let c = dir.path().join("c.mkv");
        fs::write(&a, b"first").unwrap();
        fs::write(&c, b"second").unwrap();

        // 第二条撤销会把文件放回 b；第一条的原位置 a 已被占用
        let log_path = dir.path().join("ops.jsonl");
        let mut log = OperationLog::open(&log_path).unwrap();
        log.append(&[
            LogEntry::new(a.clone(), b.clone(), "h1".into()),
            LogEntry::new(b.clone(), c.clone(), "h2".into()),
        ])
        .unwrap();
        drop(log);

        let preview = undo_log(&log_path, true, false).unwrap();
        assert_eq!(preview.restored.len(), 1);
        assert_eq!(preview.failed.len(), 1);
        assert!(preview.failed[0].1.contains("occupied"));
    }

    #[test]
    fn test_failed_entries_stay_in_log() {
        let dir = tempfile::tempdir().unwrap();
        let orig = dir.path().join("a.mkv");
        let moved = dir.path().join("b.mkv");
        fs::write(&moved, b"changed").unwrap();

        let log_path = dir.path().join("ops.jsonl");
        let mut log = OperationLog::open(&log_path).unwrap();
        log.append(&[
            LogEntry::new(orig.clone(), moved.clone(), "stale-hash".into()),
            LogEntry::new(dir.path().join("x.mkv"), dir.path().join("gone.mkv"), "h".into()),
        ])
        .unwrap();
        drop(log);

        let report = undo_log(&log_path, false, true).unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.failed.len(), 2);
        assert!(moved.exists());

        let remaining = read_entries(&log_path).unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].original, orig);
    }
}
