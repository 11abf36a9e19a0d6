//! # 文件操作执行器
//!
//! 对单个处理结果执行：创建目录 → 计算哈希 → 移动 → 生成日志条目。
//! 这几步作为一个整体：任何一步失败，文件保持在原位置，结果带 `error`，
//! 不产生日志条目。
//!
//! ## 功能
//! - 按目标目录分组执行，每组目录只创建一次
//! - 同一组内的移动在当前线程池中并行
//! - 跨文件系统时退化为 复制 + 校验 + 删除源文件
//! - dry-run 不做任何修改，也不产生日志
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 调用
//! - 使用 `fileops/hash.rs`, `fileops/oplog.rs`
//! - 使用 `rayon` 并行

use super::hash::sha256_file;
use super::oplog::LogEntry;
use crate::models::ProcessingResult;

use rayon::prelude::*;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::sync::mpsc::Sender;

/// 文件操作执行器
#[derive(Debug, Clone, Copy)]
pub struct FileOperationExecutor {
    dry_run: bool,
}

impl FileOperationExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// 执行一个目标目录下的全部操作
    ///
    /// 成功的移动通过 `log_tx` 发送日志条目（按完成顺序）。
    pub fn execute_group(
        &self,
        dir: &Path,
        members: Vec<(usize, ProcessingResult)>,
        log_tx: &Sender<LogEntry>,
    ) -> Vec<(usize, ProcessingResult)> {
        if !self.dry_run {
            if let Err(e) = ensure_directory(dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to create directory");
                return members
                    .into_iter()
                    .map(|(idx, mut result)| {
                        result.mark_failed(format!(
                            "failed to create directory {}: {}",
                            dir.display(),
                            e
                        ));
                        (idx, result)
                    })
                    .collect();
            }
        }

        members
            .into_par_iter()
            .map(|(idx, result)| {
                let (result, entry) = self.execute(result);
                if let Some(entry) = entry {
                    if let Err(e) = log_tx.send(entry) {
                        tracing::error!(entry = ?e.0, "operation log sink closed");
                    }
                }
                (idx, result)
            })
            .collect()
    }

    /// 执行单个文件（目标目录需已存在）
    pub fn execute(&self, mut result: ProcessingResult) -> (ProcessingResult, Option<LogEntry>) {
        if !result.is_actionable() || self.dry_run {
            return (result, None);
        }
        let Some(dest) = result.new_path.clone() else {
            return (result, None);
        };

        match relocate(&result.original_path, &dest) {
            Ok(hash) => {
                tracing::debug!(
                    from = %result.original_path.display(),
                    to = %dest.display(),
                    "moved"
                );
                let entry = LogEntry::new(result.original_path.clone(), dest, hash);
                (result, Some(entry))
            }
            Err(e) => {
                result.mark_failed(e.to_string());
                (result, None)
            }
        }
    }

    /// 把已移动到 `moved` 的文件放回 `original`
    ///
    /// 返回记录这次反向移动的日志条目；dry-run 不做修改，返回 `None`。
    pub fn reverse(&self, moved: &Path, original: &Path) -> io::Result<Option<LogEntry>> {
        if self.dry_run {
            return Ok(None);
        }
        if let Some(parent) = original.parent() {
            ensure_directory(parent)?;
        }
        let hash = relocate(moved, original)?;
        Ok(Some(LogEntry::new(
            moved.to_path_buf(),
            original.to_path_buf(),
            hash,
        )))
    }
}

/// 幂等地创建目录（已存在不是错误）
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    match fs::create_dir_all(dir) {
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        other => other,
    }
}

/// 哈希源文件后移动；返回内容哈希
fn relocate(src: &Path, dest: &Path) -> io::Result<String> {
    let hash = sha256_file(src)
        .map_err(|e| io::Error::new(e.kind(), format!("failed to hash source: {}", e)))?;
    move_file(src, dest, Some(&hash))?;
    Ok(hash)
}

/// 移动文件，不覆盖已存在的目标
///
/// 跨文件系统时复制后删除源文件；提供 `expected_hash` 时先校验副本。
/// 任何一步失败都会删除已写出的副本，源文件保持不变。
pub fn move_file(src: &Path, dest: &Path, expected_hash: Option<&str>) -> io::Result<()> {
    if dest.exists() {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("destination already exists: {}", dest.display()),
        ));
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => copy_then_remove(src, dest, expected_hash),
        Err(e) => Err(e),
    }
}

fn copy_then_remove(src: &Path, dest: &Path, expected_hash: Option<&str>) -> io::Result<()> {
    let discard_copy = |e: io::Error| {
        let _ = fs::remove_file(dest);
        e
    };

    fs::copy(src, dest).map_err(discard_copy)?;

    if let Some(expected) = expected_hash {
        let copied = sha256_file(dest).map_err(discard_copy)?;
        if copied != expected {
            return Err(discard_copy(io::Error::new(
                ErrorKind::InvalidData,
                "copied file hash mismatch",
            )));
        }
    }

    fs::remove_file(src).map_err(discard_copy)
}
