//! # 中断处理
//!
//! 把 Ctrl+C 转换为流水线的取消请求：第一次中断在当前批次结束后停止，
//! 第二次中断立即退出进程。
//!
//! ## 依赖关系
//! - 被 `commands/organise.rs` 使用
//! - 使用 `tokio::signal` 监听信号（独立线程上的单线程运行时）

use crate::batch::CancelToken;
use crate::error::{OrganiserError, Result};
use crate::utils::output;

/// 第二次中断时的退出码（128 + SIGINT）
const FORCED_EXIT_CODE: i32 = 130;

/// 在后台线程监听 Ctrl+C，收到后触发 `token`
pub fn install_interrupt_handler(token: CancelToken) -> Result<()> {
    let listener_err =
        |e: std::io::Error| OrganiserError::Other(format!("failed to start signal listener: {}", e));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(listener_err)?;

    std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "failed to listen for Ctrl+C");
                    return;
                }
                tracing::warn!("received Ctrl+C, stopping after the current batch");
                output::print_warning(
                    "Interrupted: finishing the current batch (press Ctrl+C again to abort)",
                );
                token.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::error!("received second Ctrl+C, exiting immediately");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            })
        })
        .map_err(listener_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installing_does_not_cancel() {
        let token = CancelToken::new();
        install_interrupt_handler(token.clone()).unwrap();
        assert!(!token.is_cancelled());
    }
}
