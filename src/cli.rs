//! CLI 参数定义

use crate::config::LauncherConfig;
use crate::error::{LaunchError, Result};
use crate::types::FailurePolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// preflight - 带预检的 Web 应用启动器
#[derive(Parser)]
#[command(
    name = "preflight",
    version,
    about = "带模块预检的 Web 应用启动器",
    long_about = "设置搜索路径、可选激活虚拟环境、逐个检查关键模块能否导入，全部通过后启动 Web 服务并等待其退出"
)]
pub struct Cli {
    /// 不指定子命令时等同于 launch
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 配置文件路径（默认查找 ./preflight.toml）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 项目根目录（默认当前目录）
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 预检并启动服务（默认）
    Launch {
        #[command(flatten)]
        args: LaunchArgs,

        /// 覆盖服务端口
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 只做预检，不启动服务
    Check {
        #[command(flatten)]
        args: LaunchArgs,

        /// 输出格式
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// 打印计算出的启动环境
    Env {
        #[command(flatten)]
        args: LaunchArgs,

        /// 输出格式
        #[arg(short, long, default_value = "env", value_parser = ["env", "json"])]
        format: String,

        /// 包括继承的全部变量
        #[arg(long)]
        all: bool,
    },

    /// 诊断项目布局与运行环境
    Doctor,

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// launch / check / env 共用的参数
#[derive(Args, Debug, Default, Clone)]
pub struct LaunchArgs {
    /// 临时环境变量 (KEY=VALUE)，最高优先级
    #[arg(short, long)]
    pub env: Vec<String>,

    /// 失败策略 (fail-fast/collect-all)
    #[arg(long)]
    pub policy: Option<String>,

    /// 跳过虚拟环境激活
    #[arg(long)]
    pub no_activate: bool,
}

impl LaunchArgs {
    /// 把命令行覆盖写入配置
    pub fn apply(&self, config: &mut LauncherConfig) -> Result<()> {
        if let Some(policy) = self.policy.as_deref() {
            config.preflight.policy = parse_policy(policy)?;
        }
        if self.no_activate {
            config.activation.enabled = false;
        }
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// 在项目根目录写入默认配置
    Init {
        #[arg(short, long)]
        force: bool,
    },
    /// 显示生效的配置
    Show,
    /// 验证配置
    Validate,
}

/// 解析失败策略参数
pub fn parse_policy(s: &str) -> Result<FailurePolicy> {
    FailurePolicy::parse(s).ok_or_else(|| {
        LaunchError::Config(format!("无效的失败策略: {} (可选 fail-fast, collect-all)", s))
    })
}
