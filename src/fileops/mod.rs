//! # 文件操作模块
//!
//! 目录创建、移动、内容哈希、操作日志与撤销，以及运行后的空目录清理。
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs`, `commands/undo.rs` 使用
//! - 子模块: cleanup, executor, hash, oplog, undo

pub mod cleanup;
pub mod executor;
pub mod hash;
pub mod oplog;
pub mod undo;

pub use cleanup::remove_empty_dirs;
pub use executor::FileOperationExecutor;
pub use oplog::{LogEntry, OperationLog, DEFAULT_LOG_NAME};
pub use undo::undo_log;
