//! 开发期诊断日志
//!
//! - **tracing（本模块）**：通过 `RUST_LOG` 控制，输出到 stderr，不属于产品输出
//! - **状态行（`preflight::report`）**：面向操作者的 ℹ️/✅/❌ 输出，不受 `RUST_LOG` 影响

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化 tracing
///
/// 读取 `RUST_LOG`；未设置时默认 `warn`，`--verbose` 时默认 `preflight=debug`。
///
/// # Example
/// ```bash
/// RUST_LOG=preflight=trace preflight check
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "preflight=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
