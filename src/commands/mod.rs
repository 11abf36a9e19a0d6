//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `fileops/`, `utils/`
//! - 子模块: organise, probe, undo

pub mod organise;
pub mod probe;
pub mod undo;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Organise(args) => organise::execute(args),
        Commands::Undo(args) => undo::execute(args),
        Commands::Probe(args) => probe::execute(args),
    }
}
