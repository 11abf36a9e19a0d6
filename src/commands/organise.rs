//! # organise 命令实现
//!
//! 组装探测器、分类器和流水线，运行后展示结果。
//!
//! ## 功能
//! - 由流水线进度回调驱动进度条
//! - Ctrl+C 在当前批次结束后停止，已完成部分照常汇总
//! - 结果表格、失败列表与统计摘要
//! - 可选 CSV 报告
//!
//! ## 依赖关系
//! - 使用 `cli/organise.rs` 定义的参数
//! - 使用 `batch/pipeline.rs`, `probe/ffprobe.rs`, `classify/gemini.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`, `utils/report.rs`, `utils/interrupt.rs`

use crate::batch::{CancelToken, Pipeline, PipelineConfig, RunReport};
use crate::classify::GeminiClassifier;
use crate::cli::organise::OrganiseArgs;
use crate::error::{OrganiserError, Result};
use crate::probe::FfprobeProber;
use crate::utils::{interrupt, output, progress, report};

use std::path::Path;
use std::time::Duration;
use tabled::Table;

/// 失败列表最多显示的条数
const MAX_LISTED_FAILURES: usize = 10;

/// 执行 organise 命令
pub fn execute(args: OrganiseArgs) -> Result<()> {
    output::print_header(if args.dry_run {
        "Organising Media Library (dry run)"
    } else {
        "Organising Media Library"
    });

    let config = build_config(&args);
    config.validate()?;

    if args.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        return Err(OrganiserError::InvalidArgument(
            "no Gemini API key: pass --api-key or set GEMINI_API_KEY".to_string(),
        ));
    }

    let prober = FfprobeProber::new(config.timeout()).with_binary(args.ffprobe.clone());
    let mut classifier =
        GeminiClassifier::new(args.api_key.clone(), Duration::from_secs(args.request_timeout))?
            .with_model(args.model.clone());
    if let Some(ref endpoint) = args.endpoint {
        classifier = classifier.with_endpoint(endpoint.clone());
    }

    output::print_info(&format!("Source: {}", args.source.display()));
    output::print_info(&format!("Target: {}", args.target.display()));
    output::print_info(&format!(
        "Workers: {}, batch size: {}",
        config.max_workers,
        config.effective_batch_size()
    ));
    if config.effective_batch_size() < config.batch_size {
        output::print_warning(&format!(
            "Batch size reduced to {} by --memory-limit-mb {}",
            config.effective_batch_size(),
            args.memory_limit_mb
        ));
    }

    let cancel = CancelToken::new();
    if let Err(e) = interrupt::install_interrupt_handler(cancel.clone()) {
        output::print_warning(&format!("Ctrl+C will not stop the run cleanly: {}", e));
    }
    let pipeline = Pipeline::new(config, prober, classifier).with_cancel_token(cancel);

    let pb = progress::create_percent_bar("Processing");
    let mut on_progress = |percent: u8| pb.set_position(u64::from(percent));
    let outcome = pipeline.run(&args.source, &args.target, args.dry_run, Some(&mut on_progress));
    pb.finish_and_clear();

    let run = match outcome {
        Ok(run) => run,
        Err(e) => {
            if let OrganiserError::Aborted { moved, .. } = &e {
                if *moved > 0 {
                    output::print_warning(&undo_hint(
                        *moved,
                        &pipeline.config().log_path_for(&args.target),
                    ));
                }
            }
            return Err(e);
        }
    };

    show_results(&run, &args);

    if let Some(ref path) = args.report {
        report::save_results_csv(&run.results, path)?;
        output::print_success(&format!("Full report saved to '{}'", path.display()));
    }

    show_summary(&run, args.dry_run, &args.target, &pipeline.config().log_path_for(&args.target));
    Ok(())
}

fn build_config(args: &OrganiseArgs) -> PipelineConfig {
    let config = PipelineConfig::default()
        .with_batch_size(args.batch_size)
        .with_timeout_seconds(args.timeout)
        .with_memory_limit_mb(Some(args.memory_limit_mb))
        .with_classify_retries(args.retries)
        .with_log_path(args.log.clone());
    match args.jobs {
        Some(jobs) => config.with_max_workers(jobs),
        None => config,
    }
}

/// 结果表格与失败列表
fn show_results(run: &RunReport, args: &OrganiseArgs) {
    if run.results.is_empty() {
        output::print_warning("No video files found in the source directory.");
        return;
    }

    output::print_header(&format!(
        "First {} of {} Results",
        args.top_n.min(run.results.len()),
        run.results.len()
    ));
    let rows = report::result_rows(run.results.iter().take(args.top_n), &args.target);
    println!("{}", Table::new(&rows));

    let failures: Vec<_> = run.failed().collect();
    if !failures.is_empty() {
        output::print_separator();
        for r in failures.iter().take(MAX_LISTED_FAILURES) {
            output::print_warning(&format!(
                "{}: {}",
                r.original_path.display(),
                r.error.as_deref().unwrap_or_default()
            ));
        }
        if failures.len() > MAX_LISTED_FAILURES {
            output::print_info(&format!(
                "... and {} more (use --report for the full list)",
                failures.len() - MAX_LISTED_FAILURES
            ));
        }
    }

    let skipped = run.skipped().count();
    if skipped > 0 {
        output::print_skip(&format!("{} files skipped (duplicates or existing destinations)", skipped));
    }
}

/// 统计摘要
fn show_summary(run: &RunReport, dry_run: bool, target: &Path, log_path: &Path) {
    let stats = &run.stats;
    output::print_separator();
    output::print_stat("Files processed", stats.files_processed);
    output::print_stat("Batches", stats.batches);
    output::print_stat("Probe calls", stats.probe_calls);
    output::print_stat("Succeeded", stats.succeeded);
    output::print_stat("Skipped", stats.skipped);
    output::print_stat("Errors", stats.errors);
    output::print_stat("Moved", stats.moved);
    output::print_stat("Total time", format!("{:.2?}", stats.total_time));
    output::print_separator();

    if stats.cancelled {
        output::print_warning(&format!(
            "Run cancelled after {} batches; remaining files were not processed.",
            stats.batches
        ));
        if stats.moved > 0 {
            output::print_warning(&undo_hint(stats.moved, log_path));
        }
    }

    if dry_run {
        output::print_done(&format!(
            "Dry run: {} files would be moved into '{}'",
            stats.succeeded,
            target.display()
        ));
    } else {
        output::print_done(&format!(
            "Moved {} files into '{}'",
            stats.moved,
            target.display()
        ));
        if stats.moved > 0 {
            output::print_info(&format!("Operation log: {}", log_path.display()));
        }
    }
}

/// 提示如何撤销已完成的移动
fn undo_hint(moved: usize, log_path: &Path) -> String {
    format!(
        "{} files were already moved; run `media-organiser undo --log {}` to revert",
        moved,
        log_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_hint_names_log() {
        let hint = undo_hint(3, Path::new("/lib/.media-organiser-operations.jsonl"));
        assert!(hint.starts_with("3 files were already moved"));
        assert!(hint.contains("undo --log /lib/.media-organiser-operations.jsonl"));
    }
}
