//! # 工作线程池
//!
//! 一次运行只创建一个固定大小的线程池，各阶段的并发任务都在其中执行，
//! 同时在途的任务数不超过 `max_workers`。池在运行结束时随所有权释放。
//!
//! ## 功能
//! - 基于 rayon 的有序并行映射
//! - 批次划分
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs`, `commands/probe.rs` 调用
//! - 使用 `rayon` 进行并行计算, `num_cpus` 计算默认线程数

use crate::error::{OrganiserError, Result};

use rayon::prelude::*;

/// 默认工作线程数：min(32, CPU 核数 + 4)
pub fn default_workers() -> usize {
    (num_cpus::get() + 4).min(32)
}

/// 批次数量：ceil(total / batch_size)
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

/// 有界工作线程池
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// 创建线程池（0 表示使用默认线程数）
    pub fn new(workers: usize) -> Result<Self> {
        let workers = if workers == 0 {
            default_workers()
        } else {
            workers
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("organiser-worker-{}", i))
            .build()
            .map_err(|e| OrganiserError::WorkerPool(e.to_string()))?;

        tracing::debug!(workers, "worker pool started");
        Ok(Self { pool, workers })
    }

    /// 线程数
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 并行映射，结果顺序与输入一致
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        self.pool.install(|| items.into_par_iter().map(f).collect())
    }

    /// 在线程池内执行任意并行任务
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        tracing::debug!(workers = self.workers, "worker pool released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(0, 50), 0);
        assert_eq!(batch_count(1, 50), 1);
        assert_eq!(batch_count(50, 50), 1);
        assert_eq!(batch_count(51, 50), 2);
        assert_eq!(batch_count(7, 3), 3);
        assert_eq!(batch_count(7, 0), 0);
    }

    #[test]
    fn test_default_workers_bounds() {
        let n = default_workers();
        assert!(n >= 5 && n <= 32);
    }

    #[test]
    fn test_map_preserves_order() {
        let pool = WorkerPool::new(4).unwrap();
        let out = pool.map((0..100).collect(), |x: i32| x * 2);
        assert_eq!(out, (0..100).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrency_never_exceeds_workers() {
        let pool = WorkerPool::new(3).unwrap();
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        pool.map((0..24).collect(), |_: i32| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.workers(), 3);
    }
}
