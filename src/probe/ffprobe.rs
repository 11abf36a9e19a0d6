//! # ffprobe 探测实现
//!
//! 一次 ffprobe 调用同时取回视频流宽高、时长、编码、码率与容器时长、大小，
//! 而不是分别调用三次（分辨率 / 可播放性 / 时长）。
//!
//! ## 功能
//! - 子进程超时：轮询 `try_wait`，到期后 kill 并返回 `ProbeError::Timeout`
//! - stdout/stderr 在独立线程中读取，避免管道写满导致子进程阻塞
//! - JSON 解析为 `FileMetadata`
//!
//! ## 依赖关系
//! - 被 `probe/mod.rs` 导出
//! - 使用 `serde_json` 解析输出

use super::{ProbeError, Prober};
use crate::models::metadata::{quality_from_dimensions, quality_from_size, size_on_disk};
use crate::models::FileMetadata;

use serde::Deserialize;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 基于 ffprobe 的探测器
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// ffprobe 可执行文件
    binary: PathBuf,
    /// 单次调用超时
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
            timeout,
        }
    }

    /// 指定 ffprobe 路径
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height,duration,bit_rate",
            "-show_entries",
            "format=duration,size,bit_rate",
            "-of",
            "json",
        ])
        .arg(path);
        cmd
    }
}

impl Prober for FfprobeProber {
    fn try_probe(&self, path: &Path) -> Result<FileMetadata, ProbeError> {
        let command = self.binary.display().to_string();
        let stdout = run_with_timeout(self.command(path), &command, self.timeout)?;
        let text = String::from_utf8_lossy(&stdout);
        parse_probe_output(path, &text)
    }
}

/// 运行子进程，超时则终止
fn run_with_timeout(
    mut cmd: Command,
    command: &str,
    timeout: Duration,
) -> Result<Vec<u8>, ProbeError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProbeError::CommandNotFound {
                command: command.to_string(),
            },
            _ => ProbeError::Io(e.to_string()),
        })?;

    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeError::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(ProbeError::Io(e.to_string()));
            }
        }
    };

    let stdout = stdout_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    if status.success() {
        Ok(stdout)
    } else {
        Err(ProbeError::CommandFailed {
            command: command.to_string(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

// ─────────────────────────────────────────────────────────────
// ffprobe JSON 输出
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

/// 解析 ffprobe JSON 输出
pub fn parse_probe_output(path: &Path, json: &str) -> Result<FileMetadata, ProbeError> {
    let output: ProbeOutput =
        serde_json::from_str(json).map_err(|e| ProbeError::ParseError(e.to_string()))?;

    let stream = output.streams.into_iter().next();
    let format = output.format;

    // ffprobe 把数值字段输出为字符串，"N/A" 视为缺失
    let parse_f64 = |s: Option<&String>| s.and_then(|v| v.parse::<f64>().ok());
    let parse_u64 = |s: Option<&String>| s.and_then(|v| v.parse::<u64>().ok());

    let duration = parse_f64(stream.as_ref().and_then(|s| s.duration.as_ref()))
        .or_else(|| parse_f64(format.as_ref().and_then(|f| f.duration.as_ref())))
        .filter(|d| d.is_finite() && *d >= 0.0);

    let file_size =
        parse_u64(format.as_ref().and_then(|f| f.size.as_ref())).or_else(|| size_on_disk(path));

    let bit_rate = parse_u64(stream.as_ref().and_then(|s| s.bit_rate.as_ref()))
        .or_else(|| parse_u64(format.as_ref().and_then(|f| f.bit_rate.as_ref())));

    let (width, height, codec) = match stream {
        Some(s) => (s.width, s.height, s.codec_name),
        None => (None, None, None),
    };

    let quality = match (width, height) {
        (Some(w), Some(h)) => quality_from_dimensions(w, h),
        _ => file_size.map(quality_from_size).unwrap_or(0),
    };

    Ok(FileMetadata {
        path: path.to_path_buf(),
        duration,
        quality,
        playable: duration.map(|d| d > 0.0).unwrap_or(false),
        width,
        height,
        file_size,
        codec,
        bit_rate,
        error: None,
    })
}
