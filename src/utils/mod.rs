//! # 工具函数模块
//!
//! 提供美化输出、进度条、结果表格、CSV 报告与中断处理等工具。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 子模块: interrupt, output, progress, report

pub mod interrupt;
pub mod output;
pub mod progress;
pub mod report;
