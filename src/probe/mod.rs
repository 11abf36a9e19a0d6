//! # 元数据探测模块
//!
//! 每个文件只调用一次外部探测命令，得到时长、视频流尺寸、编码/码率等信息。
//!
//! ## 功能
//! - `Prober` trait：探测接口，流水线通过它调用（测试中可替换）
//! - `FfprobeProber`：基于 `ffprobe -of json` 的实现，带单次调用超时
//! - 失败降级：任何错误都转成带 `error` 的 `FileMetadata`，不会丢弃文件
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs`, `commands/probe.rs` 使用
//! - 使用 `models/metadata.rs`

pub mod ffprobe;

pub use ffprobe::FfprobeProber;

use crate::models::FileMetadata;

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 单次探测错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// 超时（子进程已被终止）
    #[error("timeout")]
    Timeout(Duration),

    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to parse probe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// 媒体文件探测器
///
/// 实现必须可在线程间共享：同一个探测器会被工作线程池并发调用。
pub trait Prober: Send + Sync {
    /// 探测单个文件，返回类型化错误
    fn try_probe(&self, path: &Path) -> Result<FileMetadata, ProbeError>;

    /// 探测单个文件，失败时降级为带错误信息的元数据
    fn probe(&self, path: &Path) -> FileMetadata {
        match self.try_probe(path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "probe failed, degrading");
                FileMetadata::failed(path, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysTimeout;

    impl Prober for AlwaysTimeout {
        fn try_probe(&self, _path: &Path) -> Result<FileMetadata, ProbeError> {
            Err(ProbeError::Timeout(Duration::from_secs(1)))
        }
    }

    #[test]
    fn test_probe_degrades_on_error() {
        let meta = AlwaysTimeout.probe(Path::new("/nope/x.mkv"));
        assert_eq!(meta.error.as_deref(), Some("timeout"));
        assert_eq!(meta.duration, None);
        assert_eq!(meta.path, Path::new("/nope/x.mkv"));
    }
}
