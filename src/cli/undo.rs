//! # undo 子命令 CLI 定义
//!
//! 按操作日志倒序把文件移回原位置
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/undo.rs`

use clap::Args;
use std::path::PathBuf;

/// undo 子命令参数
#[derive(Args, Debug)]
pub struct UndoArgs {
    /// Operation log to replay
    #[arg(long, conflicts_with = "target")]
    pub log: Option<PathBuf>,

    /// Library root whose default operation log should be replayed
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Show what would be restored without moving anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Skip the content hash check before moving a file back
    #[arg(long, default_value_t = false)]
    pub no_verify: bool,
}
