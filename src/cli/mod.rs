//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `organise`: 扫描源目录，整理到媒体库
//! - `undo`: 按操作日志撤销移动
//! - `probe`: 只探测文件元数据（诊断用）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: organise, probe, undo

pub mod organise;
pub mod probe;
pub mod undo;

use clap::{Parser, Subcommand};

/// media-organiser - 媒体库整理工具
#[derive(Parser)]
#[command(name = "media-organiser")]
#[command(version)]
#[command(about = "Organise a folder of video files into a Movies / TV Shows library", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug diagnostics on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Probe, classify and move video files into a library layout
    #[command(alias = "organize")]
    Organise(organise::OrganiseArgs),

    /// Undo the moves recorded in an operation log
    Undo(undo::UndoArgs),

    /// Print technical metadata for video files
    Probe(probe::ProbeArgs),
}
