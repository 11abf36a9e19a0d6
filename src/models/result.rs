//! # 处理结果数据模型
//!
//! 每个源文件对应一个 `ProcessingResult`，由流水线在分类之后生成，
//! 文件操作阶段再对其补充目标路径、跳过标记或错误。
//!
//! ## 约束
//! - `skipped == true` ⇒ `new_path` 为空，且未对该文件做任何文件系统修改
//! - `error` 非空 ⇒ 未对该文件做任何文件系统修改
//!
//! ## 依赖关系
//! - 被 `library/`, `fileops/`, `batch/`, `commands/` 使用

use super::identification::MediaType;
use super::metadata::FileMetadata;

use serde::Serialize;
use std::path::PathBuf;

/// 分类前附带的元数据：探测结果 + 分类置信度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub file: FileMetadata,
    pub confidence: f32,
}

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    /// 源路径
    pub original_path: PathBuf,

    /// 目标路径（跳过或无法解析时为空）
    pub new_path: Option<PathBuf>,

    /// 清理后的剧集/电影名
    pub show_name: String,

    /// 集数描述
    pub episode_info: String,

    /// 媒体类型
    pub media_type: MediaType,

    /// 元数据
    pub metadata: ResultMetadata,

    /// 是否花絮/附加内容
    pub is_extra: bool,

    /// 错误信息
    pub error: Option<String>,

    /// 是否跳过
    pub skipped: bool,

    /// 跳过原因
    pub skip_reason: Option<String>,
}

impl ProcessingResult {
    /// 以探测结果创建空白结果
    pub fn new(file: FileMetadata) -> Self {
        ProcessingResult {
            original_path: file.path.clone(),
            new_path: None,
            show_name: String::new(),
            episode_info: "Unknown".to_string(),
            media_type: MediaType::Unknown,
            metadata: ResultMetadata {
                file,
                confidence: 0.0,
            },
            is_extra: false,
            error: None,
            skipped: false,
            skip_reason: None,
        }
    }

    /// 标记为跳过，清除目标路径
    pub fn mark_skipped(&mut self, reason: impl Into<String>) {
        self.skipped = true;
        self.new_path = None;
        self.skip_reason = Some(reason.into());
    }

    /// 记录错误
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    /// 是否计划或已完成移动
    pub fn is_actionable(&self) -> bool {
        !self.skipped && self.error.is_none() && self.new_path.is_some()
    }

    /// 质量评分
    pub fn quality(&self) -> u32 {
        self.metadata.file.quality
    }

    /// 文件大小
    pub fn file_size(&self) -> Option<u64> {
        self.metadata.file.file_size
    }
}
