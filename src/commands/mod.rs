//! 命令处理器
//!
//! 每个命令一个模块，实现 CommandHandler trait

use crate::config::{ConfigSource, LauncherConfig};
use crate::error::Result;
use crate::preflight::activation::ShellActivator;
use crate::preflight::probe::InterpreterProbe;
use crate::preflight::{Hooks, ProcessLauncher, Reporter, Sequencer};
use crate::utils::env_merge::EnvMerger;
use std::path::PathBuf;
use std::time::Duration;

pub mod check;
pub mod config;
pub mod doctor;
pub mod env;
pub mod launch;

/// 命令上下文
#[derive(Debug)]
pub struct CommandContext {
    pub verbose: bool,
    pub project_root: PathBuf,
    pub config: LauncherConfig,
    pub config_source: ConfigSource,
}

impl CommandContext {
    /// 带命令行覆盖的流水线
    pub fn sequencer<'a>(
        &self,
        config: &'a LauncherConfig,
        env_args: &[String],
    ) -> Result<Sequencer<'a>> {
        let overrides = EnvMerger::parse_temp_vars(env_args)?;
        Ok(Sequencer::new(config, &self.project_root).with_overrides(overrides))
    }
}

/// 命令处理器 trait
pub trait CommandHandler {
    /// 执行命令，返回进程退出码
    fn execute(&self, ctx: &CommandContext) -> Result<i32>;
}

/// 按配置构造真实的外部协作者并执行 `f`
pub fn with_process_hooks<R>(
    config: &LauncherConfig,
    reporter: &dyn Reporter,
    f: impl FnOnce(&Hooks<'_>) -> R,
) -> R {
    let activator = ShellActivator::new(Duration::from_secs(config.activation.timeout_secs));
    let probe = InterpreterProbe::new(
        &config.preflight.interpreter,
        Duration::from_secs(config.preflight.timeout_secs),
    );
    let launcher = ProcessLauncher;
    let hooks = Hooks {
        activator: &activator,
        probe: &probe,
        launcher: &launcher,
        reporter,
    };
    f(&hooks)
}
