//! # 媒体库布局模块
//!
//! 决定文件在目标媒体库中的位置，以及多个文件争用同一位置时保留哪一个。
//!
//! ## 功能
//! - `layout`: 由识别结果计算目标相对路径（dry-run 与实际运行共用）
//! - `extras`: 花絮/附加内容检测
//! - `duplicates`: 同目标路径的重复文件裁决
//!
//! ## 依赖关系
//! - 被 `batch/pipeline.rs` 使用
//! - 使用 `models/`

pub mod duplicates;
pub mod extras;
pub mod layout;

pub use duplicates::resolve_duplicates;
pub use extras::classify_extra;
pub use layout::{clean_filename, relative_destination};
