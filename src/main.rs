//! # media-organiser - 媒体库整理工具
//!
//! 扫描一个目录中的视频文件，探测技术元数据、按文件名识别剧集/电影，
//! 然后移动到 `Movies/` 与 `TV Shows/` 结构的媒体库中，并记录可撤销的操作日志。
//!
//! ## 子命令
//! - `organise` - 探测、分类并移动文件
//! - `undo`     - 按操作日志撤销移动
//! - `probe`    - 只探测元数据（诊断用）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (分阶段批处理流水线)
//!   │     ├── probe/     (ffprobe 元数据探测)
//!   │     ├── classify/  (文件名识别)
//!   │     ├── library/   (媒体库布局、花絮、去重)
//!   │     ├── fileops/   (移动、哈希、操作日志、撤销)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod classify;
mod cli;
mod commands;
mod error;
mod fileops;
mod library;
mod models;
mod probe;
mod utils;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::run(cli.command) {
        tracing::debug!(error = ?e, "command failed");
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

/// 诊断日志写到 stderr；RUST_LOG 优先于 --verbose
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
