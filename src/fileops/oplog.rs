//! # 操作日志
//!
//! 每次成功的实际移动追加一行 JSON（JSON Lines），作为撤销的依据。
//! 日志只由流水线的协调线程写入。
//!
//! ## 格式
//! ```text
//! {"timestamp":"2026-10-16T08:00:00Z","original":"/src/a.mkv","new":"/lib/...","hash":"ab12..."}
//! ```
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs`（写入）和 `fileops/undo.rs`（读取/重写）使用
//! - 使用 `serde_json`, `chrono`

use crate::error::{OrganiserError, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// 默认日志文件名（位于目标根目录）
pub const DEFAULT_LOG_NAME: &str = ".media-organiser-operations.jsonl";

/// 单条操作记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub original: PathBuf,
    pub new: PathBuf,
    pub hash: String,
}

impl LogEntry {
    pub fn new(original: PathBuf, new: PathBuf, hash: String) -> Self {
        LogEntry {
            timestamp: Utc::now(),
            original,
            new,
            hash,
        }
    }
}

/// 追加写入的操作日志
///
/// 文件在第一次写入非空条目时才创建，没有移动任何文件的运行不会留下空日志。
#[derive(Debug)]
pub struct OperationLog {
    path: PathBuf,
    file: Option<File>,
    written: usize,
}

impl OperationLog {
    /// 准备日志位置（创建父目录）；无法创建视为致命错误
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OrganiserError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        Ok(Self {
            path,
            file: None,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 本次打开后写入的条目数
    pub fn written(&self) -> usize {
        self.written
    }

    /// 按给定顺序追加条目并落盘
    pub fn append(&mut self, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let write_err = |e: std::io::Error| OrganiserError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        };

        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)
                .map_err(|e| OrganiserError::Other(format!("Failed to encode log entry: {}", e)))?;
            buf.push(b'\n');
        }
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(write_err)?;
            self.file = Some(file);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(&buf).map_err(write_err)?;
            file.sync_data().map_err(write_err)?;
        }
        self.written += entries.len();
        Ok(())
    }
}

/// 读取全部条目（按写入顺序）；文件不存在时返回空列表
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(OrganiserError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| OrganiserError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: LogEntry =
            serde_json::from_str(&line).map_err(|e| OrganiserError::LogParseError {
                path: path.display().to_string(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// 用给定条目整体替换日志（先写临时文件再改名）；条目为空时删除日志
pub fn rewrite_entries(path: &Path, entries: &[LogEntry]) -> Result<()> {
    let write_err = |e: std::io::Error| OrganiserError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };

    if entries.is_empty() {
        return match fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(write_err(e)),
            _ => Ok(()),
        };
    }

    let tmp = path.with_extension("jsonl.tmp");
    {
        let mut file = File::create(&tmp).map_err(write_err)?;
        for entry in entries {
            let line = serde_json::to_string(entry)
                .map_err(|e| OrganiserError::Other(format!("Failed to encode log entry: {}", e)))?;
            writeln!(file, "{}", line).map_err(write_err)?;
        }
        file.sync_all().map_err(write_err)?;
    }
    fs::rename(&tmp, path).map_err(write_err)
}
