//! config 命令处理器

use super::{CommandContext, CommandHandler};
use crate::config::{self as launcher_config, PROJECT_CONFIG_FILE};
use crate::error::Result;
use crate::exit_codes;
use std::path::Path;

/// config init 命令
pub struct ConfigInitCommand {
    force: bool,
}

impl ConfigInitCommand {
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// 不依赖已加载配置，现有文件损坏时也能用 --force 重建
    pub fn run(&self, project_root: &Path, verbose: bool) -> Result<i32> {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        launcher_config::write_default(&path, self.force)?;
        println!("✓ 已写入默认配置: {}", path.display());
        if verbose {
            println!("{}", launcher_config::LauncherConfig::default().to_toml()?);
        }
        Ok(exit_codes::OK)
    }
}

impl CommandHandler for ConfigInitCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        self.run(&ctx.project_root, ctx.verbose)
    }
}

/// config show 命令
pub struct ConfigShowCommand;

impl CommandHandler for ConfigShowCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        println!("# 来源: {}", ctx.config_source);
        print!("{}", ctx.config.to_toml()?);
        Ok(exit_codes::OK)
    }
}

/// config validate 命令
///
/// 加载阶段已经完成校验，走到这里即说明配置有效
pub struct ConfigValidateCommand;

impl CommandHandler for ConfigValidateCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        ctx.config.validate()?;
        println!("✅ 配置有效: {}", ctx.config_source);
        if ctx.verbose {
            println!("   模块检查: {} 项", ctx.config.preflight.checks.len());
            for check in &ctx.config.preflight.checks {
                println!("   - {} ({}.{})", check.label, check.module, check.symbol);
            }
        }
        Ok(exit_codes::OK)
    }
}
