//! # probe 子命令 CLI 定义
//!
//! 探测视频文件的技术元数据并以表格输出
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/probe.rs`

use clap::Args;
use std::path::PathBuf;

/// probe 子命令参数
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Files or directories to probe
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// File patterns to include (comma-separated)
    #[arg(long, default_value = crate::batch::collector::VIDEO_PATTERNS)]
    pub pattern: String,

    /// Only look at the top level of each directory
    #[arg(long, default_value_t = false)]
    pub no_recursive: bool,

    /// Include hidden files (names starting with '.')
    #[arg(long, default_value_t = false)]
    pub include_hidden: bool,

    /// Per-file probe timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Number of worker threads (default: min(32, CPUs + 4))
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// ffprobe executable
    #[arg(long, env = "FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}
