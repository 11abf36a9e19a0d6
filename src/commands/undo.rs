//! # undo 命令实现
//!
//! 倒序重放操作日志，把文件移回原位置。
//!
//! ## 依赖关系
//! - 使用 `cli/undo.rs` 定义的参数
//! - 使用 `fileops/undo.rs`
//! - 使用 `utils/output.rs`

use crate::cli::undo::UndoArgs;
use crate::error::{OrganiserError, Result};
use crate::fileops::{undo_log, DEFAULT_LOG_NAME};
use crate::utils::output;

/// 执行 undo 命令
pub fn execute(args: UndoArgs) -> Result<()> {
    let log_path = match (args.log, args.target) {
        (Some(log), _) => log,
        (None, Some(target)) => target.join(DEFAULT_LOG_NAME),
        (None, None) => {
            return Err(OrganiserError::InvalidArgument(
                "pass --log <FILE> or --target <LIBRARY>".to_string(),
            ))
        }
    };

    if !log_path.is_file() {
        return Err(OrganiserError::FileNotFound {
            path: log_path.display().to_string(),
        });
    }

    output::print_header(if args.dry_run {
        "Undoing Moves (dry run)"
    } else {
        "Undoing Moves"
    });

    let report = undo_log(&log_path, args.dry_run, !args.no_verify)?;

    if report.total() == 0 {
        output::print_info("Operation log is empty, nothing to undo.");
        return Ok(());
    }

    for entry in &report.restored {
        output::print_move(
            &entry.new.display().to_string(),
            &entry.original.display().to_string(),
        );
    }
    for (entry, reason) in &report.failed {
        output::print_warning(&format!("{}: {}", entry.new.display(), reason));
    }

    if args.dry_run {
        output::print_done(&format!(
            "{} of {} moves can be undone",
            report.restored.len(),
            report.total()
        ));
    } else {
        output::print_done(&format!(
            "Restored {} of {} files",
            report.restored.len(),
            report.total()
        ));
        if !report.failed.is_empty() {
            output::print_info(&format!(
                "{} entries kept in '{}' for another attempt",
                report.failed.len(),
                log_path.display()
            ));
        }
    }

    Ok(())
}
