//! # organise 子命令 CLI 定义
//!
//! 扫描源目录中的视频文件，识别后移动到目标媒体库
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/organise.rs`

use clap::Args;
use std::path::PathBuf;

/// organise 子命令参数
#[derive(Args, Debug)]
pub struct OrganiseArgs {
    /// Directory to scan for video files
    pub source: PathBuf,

    /// Library root to move files into
    pub target: PathBuf,

    /// Plan every move without touching the filesystem
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Number of worker threads (default: min(32, CPUs + 4))
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Files per batch
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Per-file probe timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Memory budget in MB, caps the effective batch size
    #[arg(long, default_value_t = 512)]
    pub memory_limit_mb: u64,

    /// Operation log path (default: <TARGET>/.media-organiser-operations.jsonl)
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Write every result to a CSV report
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Number of rows to show in the results table
    #[arg(long, default_value_t = 20)]
    pub top_n: usize,

    // ─────────────────────────────────────────────────────────────
    // Classifier options
    // ─────────────────────────────────────────────────────────────
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = crate::classify::gemini::DEFAULT_MODEL)]
    pub model: String,

    /// Override the Gemini API base URL
    #[arg(long, env = "GEMINI_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Retries for a failed classification request, per batch
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Classification request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub request_timeout: u64,

    // ─────────────────────────────────────────────────────────────
    // Probe options
    // ─────────────────────────────────────────────────────────────
    /// ffprobe executable
    #[arg(long, env = "FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}
