//! # 分阶段批处理流水线
//!
//! 将发现的文件按固定大小划分批次，批次之间串行；每个批次依次执行三个阶段，
//! 阶段之间是硬屏障：
//!
//! ```text
//! Idle → Discovering → { Probing → Classifying → FileOps }* → Completed
//!                                                            ↘ Failed / Cancelled
//! ```
//!
//! ## 约定
//! - 每个源文件恰好产生一个 `ProcessingResult`，输出顺序与发现顺序一致
//! - 每个文件恰好一次探测调用，每个批次恰好一次分类调用（失败重试除外）
//! - 同时持有的元数据/结果数量为 O(batch_size)
//! - 线程池在运行开始时创建一次，任何退出路径上都会释放
//! - 单文件错误随数据流动；只有致命错误中止运行
//! - 取消只在批次边界检查
//!
//! ## 依赖关系
//! - 被 `commands/organise.rs` 调用
//! - 使用 `batch/collector.rs`, `batch/runner.rs`, `batch/stats.rs`
//! - 使用 `probe/`, `classify/`, `library/`, `fileops/`

use super::collector::FileCollector;
use super::runner::{batch_count, default_workers, WorkerPool};
use super::stats::RunStats;
use crate::classify::{ClassificationMap, Classifier, ClassifyError};
use crate::error::{OrganiserError, Result};
use crate::fileops::{
    remove_empty_dirs, FileOperationExecutor, LogEntry, OperationLog, DEFAULT_LOG_NAME,
};
use crate::library::duplicates::compare_candidates;
use crate::library::layout::EXTRAS_DIR;
use crate::library::{classify_extra, clean_filename, relative_destination, resolve_duplicates};
use crate::models::{Identification, ProcessingResult};
use crate::probe::Prober;

use rayon::prelude::*;
use std::cmp;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// 未能识别的文件的错误信息
pub const UNCLASSIFIED: &str = "unclassified";

/// 每个在途文件的内存预算，用于由 `memory_limit_mb` 推算批次上限
const PER_FILE_MEMORY_BYTES: u64 = 256 * 1024;

// ─────────────────────────────────────────────────────────────
// 配置
// ─────────────────────────────────────────────────────────────

/// 流水线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 工作线程数
    pub max_workers: usize,
    /// 每批文件数
    pub batch_size: usize,
    /// 单次探测超时（秒）
    pub timeout_seconds: u64,
    /// 内存上限（MB，仅用于限制批次大小）
    pub memory_limit_mb: Option<u64>,
    /// 分类失败后的重试次数
    pub classify_retries: u32,
    /// 操作日志路径（默认位于目标根目录）
    pub log_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_workers: default_workers(),
            batch_size: 50,
            timeout_seconds: 30,
            memory_limit_mb: Some(512),
            classify_retries: 1,
            log_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_memory_limit_mb(mut self, memory_limit_mb: Option<u64>) -> Self {
        self.memory_limit_mb = memory_limit_mb;
        self
    }

    pub fn with_classify_retries(mut self, retries: u32) -> Self {
        self.classify_retries = retries;
        self
    }

    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }

    /// 探测超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(OrganiserError::InvalidArgument(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(OrganiserError::InvalidArgument(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(OrganiserError::InvalidArgument(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 实际批次大小：`batch_size` 与内存上限推算值中的较小者
    pub fn effective_batch_size(&self) -> usize {
        match self.memory_limit_mb {
            Some(mb) => {
                let by_memory = (mb.saturating_mul(1024 * 1024) / PER_FILE_MEMORY_BYTES).max(1);
                self.batch_size
                    .min(usize::try_from(by_memory).unwrap_or(usize::MAX))
            }
            None => self.batch_size,
        }
    }

    /// 操作日志路径
    pub fn log_path_for(&self, target_root: &Path) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| target_root.join(DEFAULT_LOG_NAME))
    }
}

// ─────────────────────────────────────────────────────────────
// 取消与进度
// ─────────────────────────────────────────────────────────────

/// 运行级取消标记（在批次边界检查）
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 保证进度单调不减
struct ProgressReporter<'a> {
    sink: Option<&'a mut dyn FnMut(u8)>,
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: Option<&'a mut dyn FnMut(u8)>) -> Self {
        Self { sink, last: None }
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(100).max(self.last.unwrap_or(0));
        self.last = Some(percent);
        if let Some(sink) = self.sink.as_deref_mut() {
            sink(percent);
        }
    }

    fn finish(&mut self) {
        if self.last != Some(100) {
            self.report(100);
        }
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

// ─────────────────────────────────────────────────────────────
// 运行结果
// ─────────────────────────────────────────────────────────────

/// 一次运行的输出
#[derive(Debug, Clone)]
pub struct RunReport {
    /// 按发现顺序排列的结果
    pub results: Vec<ProcessingResult>,
    /// 统计快照
    pub stats: RunStats,
}

impl RunReport {
    /// 成功的结果（未出错且未跳过）
    pub fn successful(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results
            .iter()
            .filter(|r| r.error.is_none() && !r.skipped)
    }

    /// 出错的结果
    pub fn failed(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| r.error.is_some())
    }

    /// 跳过但未出错的结果
    pub fn skipped(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results
            .iter()
            .filter(|r| r.skipped && r.error.is_none())
    }
}

/// 单个批次的分类结果
enum Classification {
    Mapped(ClassificationMap),
    Failed(ClassifyError),
}

/// 单个批次的输出
struct BatchOutcome {
    results: Vec<ProcessingResult>,
    /// 让位撤回在前，本批移动在后
    entries: Vec<LogEntry>,
    probe_calls: usize,
    /// 本批完成的移动数
    moved: usize,
    /// 被本批取代的之前批次结果数
    displaced: usize,
}

/// 批次内共享的只读上下文
struct BatchContext<'a> {
    source_root: &'a Path,
    target_root: &'a Path,
    executor: FileOperationExecutor,
}

// ─────────────────────────────────────────────────────────────
// 流水线
// ─────────────────────────────────────────────────────────────

/// 批处理流水线
pub struct Pipeline<P, C> {
    config: PipelineConfig,
    prober: P,
    classifier: C,
    cancel: CancelToken,
}

impl<P: Prober, C: Classifier> Pipeline<P, C> {
    pub fn new(config: PipelineConfig, prober: P, classifier: C) -> Self {
        Self {
            config,
            prober,
            classifier,
            cancel: CancelToken::new(),
        }
    }

    /// 使用外部取消标记
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 执行完整流水线
    ///
    /// `progress` 在每个批次结束后收到总体百分比（单调不减，完成时最后一次为 100）。
    pub fn run(
        &self,
        source_root: &Path,
        target_root: &Path,
        dry_run: bool,
        progress: Option<&mut dyn FnMut(u8)>,
    ) -> Result<RunReport> {
        let start = Instant::now();
        self.config.validate()?;

        if !source_root.is_dir() {
            return Err(OrganiserError::DirectoryNotFound {
                path: source_root.display().to_string(),
            });
        }

        // Discovering
        let files = FileCollector::new(source_root.to_path_buf()).collect();
        let batch_size = self.config.effective_batch_size();
        tracing::info!(
            files = files.len(),
            batch_size,
            batches = batch_count(files.len(), batch_size),
            dry_run,
            "discovered source files"
        );

        let mut log = if dry_run {
            None
        } else {
            Some(self.prepare_target(target_root)?)
        };

        // 线程池随本函数的任一返回路径释放
        let pool = WorkerPool::new(self.config.max_workers)?;
        let ctx = BatchContext {
            source_root,
            target_root,
            executor: FileOperationExecutor::new(dry_run),
        };

        let mut reporter = ProgressReporter::new(progress);
        let mut stats = RunStats::default();
        let mut results: Vec<ProcessingResult> = Vec::with_capacity(files.len());
        // 目标路径 → 占用它的结果在 `results` 中的下标
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();

        for (batch_idx, chunk) in files.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(completed_batches = batch_idx, "run cancelled at batch boundary");
                stats.cancelled = true;
                break;
            }

            let batch_no = batch_idx + 1;
            let moved_so_far = log.as_ref().map(OperationLog::written).unwrap_or(0);
            let outcome = self
                .run_batch(&pool, chunk, &ctx, &mut results, &claimed)
                .map_err(|e| e.aborted(batch_no, moved_so_far))?;

            if let Some(log) = log.as_mut() {
                if let Err(e) = log.append(&outcome.entries) {
                    tracing::error!(
                        unlogged = outcome.entries.len(),
                        "failed to append to operation log"
                    );
                    return Err(e.aborted(batch_no, log.written()));
                }
            }

            stats.record_batch(&outcome.results, outcome.probe_calls, outcome.moved);
            stats.record_displaced(outcome.displaced, outcome.entries.len() - outcome.moved);

            let base = results.len();
            for (idx, result) in outcome.results.iter().enumerate() {
                if let Some(dest) = result.new_path.as_ref().filter(|_| result.is_actionable()) {
                    claimed.insert(dest.clone(), base + idx);
                }
            }
            results.extend(outcome.results);
            tracing::debug!(batch = batch_no, processed = results.len(), "batch complete");
            reporter.report(percent(results.len(), files.len()));
        }

        if !dry_run && !stats.cancelled {
            let removed = remove_empty_dirs(source_root, &[EXTRAS_DIR]);
            if removed > 0 {
                tracing::info!(removed, "removed empty source directories");
            }
        }

        if !stats.cancelled {
            reporter.finish();
        }
        stats.total_time = start.elapsed();

        tracing::info!(
            files = stats.files_processed,
            probe_calls = stats.probe_calls,
            errors = stats.errors,
            moved = stats.moved,
            elapsed_ms = stats.total_time.as_millis() as u64,
            "run complete"
        );

        Ok(RunReport { results, stats })
    }

    /// 创建目标根目录并准备操作日志；任何失败都是致命的
    ///
    /// 日志文件本身在第一次移动时才创建，这里只确认其所在目录可写。
    fn prepare_target(&self, target_root: &Path) -> Result<OperationLog> {
        fs::create_dir_all(target_root)
            .and_then(|_| check_writable(target_root))
            .map_err(|e| OrganiserError::TargetNotWritable {
                path: target_root.display().to_string(),
                source: e,
            })?;

        let log = OperationLog::open(self.config.log_path_for(target_root))?;
        if let Some(dir) = log
            .path()
            .parent()
            .filter(|d| !d.as_os_str().is_empty() && *d != target_root)
        {
            check_writable(dir).map_err(|e| OrganiserError::FileWriteError {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        tracing::info!(log = %log.path().display(), "operation log ready");
        Ok(log)
    }

    /// 执行一个批次
    ///
    /// `earlier` 是之前批次的结果；本批更优的候选可以取代其中占用同一目标的文件。
    fn run_batch(
        &self,
        pool: &WorkerPool,
        chunk: &[PathBuf],
        ctx: &BatchContext<'_>,
        earlier: &mut [ProcessingResult],
        claimed: &HashMap<PathBuf, usize>,
    ) -> Result<BatchOutcome> {
        // Phase 1: 探测（全部完成后才进入下一阶段）
        let prober = &self.prober;
        let metadata = pool.map(chunk.to_vec(), |path| prober.probe(&path));
        let probe_calls = chunk.len();

        // Phase 2: 分类（整批一次调用）
        let filenames: Vec<String> = chunk
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        let classification = self.classify_batch(&filenames)?;

        let mut results: Vec<ProcessingResult> = metadata
            .into_iter()
            .zip(filenames.iter())
            .map(|(meta, name)| {
                let mut result = ProcessingResult::new(meta);
                match &classification {
                    Classification::Mapped(map) => assign_destination(
                        &mut result,
                        map.get(name),
                        ctx.source_root,
                        ctx.target_root,
                    ),
                    Classification::Failed(e) => {
                        result.mark_failed(format!("classification failed: {}", e))
                    }
                }
                result
            })
            .collect();

        // Phase 3: 去重 + 文件操作
        let duplicates = resolve_duplicates(&mut results);
        if duplicates > 0 {
            tracing::debug!(duplicates, "skipped lower-ranked duplicate candidates");
        }
        let contested = reserve_destinations(&mut results, claimed, earlier);

        // 让位的文件先放回原处，日志中的撤销条目排在本批移动之前
        let mut entries = Vec::new();
        let mut displaced = 0;
        for (held, idx) in contested {
            match displace(&mut earlier[held], &results[idx], ctx.executor) {
                Ok(entry) => {
                    displaced += 1;
                    entries.extend(entry);
                }
                Err(e) => {
                    tracing::warn!(
                        file = %earlier[held].original_path.display(),
                        error = %e,
                        "failed to return displaced duplicate"
                    );
                    let reason = format!("duplicate of {}", earlier[held].original_path.display());
                    results[idx].mark_skipped(reason);
                }
            }
        }
        let reversed = entries.len();

        let (results, moves) = execute_file_ops(pool, results, ctx.executor);
        entries.extend(moves);

        Ok(BatchOutcome {
            results,
            moved: entries.len() - reversed,
            entries,
            probe_calls,
            displaced,
        })
    }

    /// 分类一个批次；非致命失败按配置重试，仍失败则整批标记错误
    fn classify_batch(&self, filenames: &[String]) -> Result<Classification> {
        let mut attempt = 0;
        loop {
            match self.classifier.classify(filenames) {
                Ok(map) => return Ok(Classification::Mapped(map)),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) if attempt < self.config.classify_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "classification failed, retrying batch");
                }
                Err(e) => {
                    tracing::error!(files = filenames.len(), error = %e, "classification failed for batch");
                    return Ok(Classification::Failed(e));
                }
            }
        }
    }
}

/// 根据识别结果填充结果字段并计算目标路径
fn assign_destination(
    result: &mut ProcessingResult,
    ident: Option<&Identification>,
    source_root: &Path,
    target_root: &Path,
) {
    let Some(ident) = ident.filter(|i| i.is_known()) else {
        result.mark_failed(UNCLASSIFIED);
        result.mark_skipped(UNCLASSIFIED);
        return;
    };

    result.media_type = ident.media_type;
    result.show_name = clean_filename(&ident.name);
    result.metadata.confidence = ident.confidence;

    let relative = result
        .original_path
        .strip_prefix(source_root)
        .unwrap_or(&result.original_path);
    let extra = classify_extra(relative, result.metadata.file.duration);
    if let Some(extra) = &extra {
        tracing::debug!(
            file = %relative.display(),
            extra_type = %extra.extra_type,
            method = ?extra.method,
            "detected extra"
        );
    }

    result.is_extra = extra.is_some();
    result.episode_info = match &extra {
        Some(extra) => format!("Extra - {}", extra.extra_type),
        None => ident.episode_info(),
    };

    match relative_destination(ident, extra.as_ref(), &result.original_path) {
        Some(rel) => result.new_path = Some(target_root.join(rel)),
        None => result.mark_failed("unresolved destination"),
    }
}

/// 预留目标路径
///
/// 目标已被之前批次占用时按重复裁决比较：本批候选更优则返回 `(earlier 下标, 本批下标)`
/// 交由调用方让位，否则本批候选跳过。未被占用但磁盘上已存在的目标一律跳过。
/// 只做读取，dry-run 与实际运行判定一致，结果也与批次大小无关。
fn reserve_destinations(
    results: &mut [ProcessingResult],
    claimed: &HashMap<PathBuf, usize>,
    earlier: &[ProcessingResult],
) -> Vec<(usize, usize)> {
    let mut contested = Vec::new();
    for (idx, result) in results.iter_mut().enumerate() {
        if !result.is_actionable() {
            continue;
        }
        let Some(dest) = result.new_path.clone() else {
            continue;
        };
        let holder = claimed
            .get(&dest)
            .copied()
            .filter(|&held| earlier[held].is_actionable());
        match holder {
            Some(held) if compare_candidates(result, &earlier[held]) == cmp::Ordering::Greater => {
                contested.push((held, idx));
            }
            Some(held) => {
                let reason = format!("duplicate of {}", earlier[held].original_path.display());
                result.mark_skipped(reason);
            }
            None if dest.exists() => result.mark_skipped("destination already exists"),
            None => {}
        }
    }
    contested
}

/// 让出目标路径：之前批次已移入的文件放回原位置并标记为跳过
///
/// 实际运行返回对应的日志条目；放回失败时不修改 `holder`。
fn displace(
    holder: &mut ProcessingResult,
    winner: &ProcessingResult,
    executor: FileOperationExecutor,
) -> std::io::Result<Option<LogEntry>> {
    let entry = match &holder.new_path {
        Some(dest) => executor.reverse(dest, &holder.original_path)?,
        None => None,
    };
    tracing::debug!(
        loser = %holder.original_path.display(),
        winner = %winner.original_path.display(),
        "displaced duplicate from an earlier batch"
    );
    holder.mark_skipped(format!("duplicate of {}", winner.original_path.display()));
    Ok(entry)
}

/// 写入并删除一个临时文件以确认目录可写
fn check_writable(dir: &Path) -> std::io::Result<()> {
    let marker = dir.join(".media-organiser-write-test");
    fs::write(&marker, b"").and_then(|_| fs::remove_file(&marker))
}

/// 按目标目录分组并行执行；返回按原顺序排列的结果与按完成顺序排列的日志条目
fn execute_file_ops(
    pool: &WorkerPool,
    results: Vec<ProcessingResult>,
    executor: FileOperationExecutor,
) -> (Vec<ProcessingResult>, Vec<LogEntry>) {
    let mut groups: BTreeMap<PathBuf, Vec<(usize, ProcessingResult)>> = BTreeMap::new();
    let mut settled = Vec::with_capacity(results.len());

    for (idx, result) in results.into_iter().enumerate() {
        let dir = if result.is_actionable() {
            result
                .new_path
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
        } else {
            None
        };
        match dir {
            Some(dir) => groups.entry(dir).or_default().push((idx, result)),
            None => settled.push((idx, result)),
        }
    }

    let (tx, rx) = mpsc::channel();
    let executed: Vec<(usize, ProcessingResult)> = pool.install(|| {
        groups
            .into_par_iter()
            .flat_map_iter(|(dir, members)| executor.execute_group(&dir, members, &tx))
            .collect()
    });
    drop(tx);
    let entries: Vec<LogEntry> = rx.into_iter().collect();

    settled.extend(executed);
    settled.sort_by_key(|(idx, _)| *idx);
    (settled.into_iter().map(|(_, r)| r).collect(), entries)
}
