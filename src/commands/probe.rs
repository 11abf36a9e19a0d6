//! # probe 命令实现
//!
//! 并行探测文件元数据并以表格输出，不做分类也不移动文件。
//!
//! ## 依赖关系
//! - 使用 `cli/probe.rs` 定义的参数
//! - 使用 `batch/collector.rs`, `batch/runner.rs`, `probe/ffprobe.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`, `utils/report.rs`

use crate::batch::{FileCollector, WorkerPool};
use crate::cli::probe::ProbeArgs;
use crate::error::{OrganiserError, Result};
use crate::probe::{FfprobeProber, Prober};
use crate::utils::{output, progress, report};

use std::time::Duration;
use tabled::Table;

/// 执行 probe 命令
pub fn execute(args: ProbeArgs) -> Result<()> {
    output::print_header("Probing Media Files");

    if args.timeout == 0 {
        return Err(OrganiserError::InvalidArgument(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    let mut files = Vec::new();
    for path in &args.paths {
        if !path.exists() {
            return Err(OrganiserError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let collector = FileCollector::new(path.clone())
            .with_pattern(&args.pattern)
            .recursive(!args.no_recursive)
            .include_hidden(args.include_hidden);
        files.extend(collector.collect());
    }

    if files.is_empty() {
        output::print_warning("No video files found.");
        return Ok(());
    }
    let pool = WorkerPool::new(args.jobs.unwrap_or(0))?;
    output::print_info(&format!(
        "Found {} video files, probing with {} workers",
        files.len(),
        pool.workers()
    ));

    let prober = FfprobeProber::new(Duration::from_secs(args.timeout)).with_binary(args.ffprobe.clone());

    let pb = progress::create_progress_bar(files.len() as u64, "Probing");
    let metadata = pool.map(files, |path| {
        let meta = prober.probe(&path);
        pb.inc(1);
        meta
    });
    pb.finish_and_clear();

    println!("{}", Table::new(report::probe_rows(&metadata)));

    let failed = metadata.iter().filter(|m| !m.is_ok()).count();
    if failed > 0 {
        output::print_warning(&format!(
            "{} of {} files could not be probed (quality estimated from size)",
            failed,
            metadata.len()
        ));
    }
    output::print_done(&format!("Probed {} files", metadata.len()));

    Ok(())
}
