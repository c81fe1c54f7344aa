//! preflight - 带模块预检的 Web 应用启动器
//!
//! 依次执行：设置搜索路径、可选激活虚拟环境、检查关键模块能否导入，
//! 全部通过后以 headless 模式启动 Web 服务并透传其退出码。

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod preflight;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use config::{ConfigSource, LauncherConfig};
pub use error::{LaunchError, Result};
pub use preflight::Sequencer;
pub use types::{FailurePolicy, PreflightReport, ProbeOutcome};
