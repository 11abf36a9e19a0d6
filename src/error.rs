//! # 统一错误处理模块
//!
//! 定义 media-organiser 的运行级（致命）错误类型，使用 `thiserror` 派生。
//!
//! 单个文件的探测/分类/移动失败不会走这里：它们以字符串形式挂在
//! `FileMetadata::error` / `ProcessingResult::error` 上随数据流动。
//! 只有会中止整个运行的错误才会成为 `OrganiserError`。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 引用 `classify::ClassifyError`

use crate::classify::ClassifyError;

use thiserror::Error;

/// media-organiser 统一错误类型
#[derive(Error, Debug)]
pub enum OrganiserError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Target root is not writable: {path}")]
    TargetNotWritable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 操作日志错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed operation log entry at {path}:{line}\nReason: {reason}")]
    LogParseError {
        path: String,
        line: usize,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 外部协作方错误
    // ─────────────────────────────────────────────────────────────
    #[error("Classification failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Run aborted in batch {batch} after {moved} completed moves: {source}")]
    Aborted {
        batch: usize,
        moved: usize,
        #[source]
        source: Box<OrganiserError>,
    },

    #[error("{0}")]
    Other(String),
}

impl OrganiserError {
    /// 包装为中止错误，附带已完成的移动数量（这些移动已写入日志，可撤销）
    pub fn aborted(self, batch: usize, moved: usize) -> Self {
        OrganiserError::Aborted {
            batch,
            moved,
            source: Box::new(self),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, OrganiserError>;
