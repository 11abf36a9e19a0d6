//! # 数据模型模块
//!
//! 定义流水线中流动的数据模型：探测元数据、分类结果、处理结果。
//!
//! ## 依赖关系
//! - 被 `probe/`, `classify/`, `library/`, `fileops/`, `batch/` 使用
//! - 子模块: metadata, identification, result

pub mod identification;
pub mod metadata;
pub mod result;

pub use identification::{Identification, MediaType};
pub use metadata::FileMetadata;
pub use result::ProcessingResult;
