//! # 批处理模块
//!
//! 分阶段批处理流水线：发现 → 探测 → 分类 → 文件操作。
//!
//! ## 功能
//! - 收集源目录下的视频文件（确定顺序）
//! - 有界线程池，整次运行只创建一次
//! - 按批次串行、批内并行的阶段调度
//! - 进度回调与运行统计
//!
//! ## 依赖关系
//! - 被 `commands/organise.rs`, `commands/probe.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 子模块: collector, pipeline, runner, stats

pub mod collector;
pub mod pipeline;
pub mod runner;
pub mod stats;

pub use collector::FileCollector;
pub use pipeline::{CancelToken, Pipeline, PipelineConfig, RunReport};
pub use runner::WorkerPool;
