//! 启动器配置 (preflight.toml)
//!
//! 查找顺序：`--config` 指定路径 → 项目根目录 `preflight.toml`
//! → 用户配置目录 `preflight/config.toml` → 内置默认值。
//! 默认值与原启动脚本的行为一一对应。

pub mod format;

use crate::error::{LaunchError, Result};
use crate::types::{FailurePolicy, ModuleCheck};
use crate::utils::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 项目级配置文件名
pub const PROJECT_CONFIG_FILE: &str = "preflight.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub environment: EnvironmentConfig,
    pub activation: ActivationConfig,
    pub preflight: PreflightConfig,
    pub server: ServerConfig,
}

/// 搜索路径变量与 .env 文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// 搜索路径变量名
    pub search_path_var: String,
    /// 有序目录列表，相对路径基于项目根目录，"." 表示根目录本身
    pub search_paths: Vec<String>,
    /// 可选的 .env 文件（相对项目根目录），不存在时跳过
    pub dotenv: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            search_path_var: "PYTHONPATH".to_string(),
            search_paths: vec![".".to_string(), "src".to_string(), "utils".to_string()],
            dotenv: Some(".env".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub enabled: bool,
    /// 激活脚本的相对路径，存在即激活
    pub script: String,
    pub timeout_secs: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script: default_activation_script().to_string(),
            timeout_secs: 30,
        }
    }
}

fn default_activation_script() -> &'static str {
    if cfg!(windows) {
        "venv\\Scripts\\activate.bat"
    } else {
        "venv/bin/activate"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    pub interpreter: String,
    pub policy: FailurePolicy,
    /// 单个模块检查的超时
    pub timeout_secs: u64,
    pub checks: Vec<ModuleCheck>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            interpreter: "python".to_string(),
            policy: FailurePolicy::FailFast,
            timeout_secs: 60,
            checks: vec![
                ModuleCheck::new(
                    "src.workflow.multi_prompt_system",
                    "MultiPromptSystem",
                    "Multi-Prompt-System",
                ),
                ModuleCheck::new(
                    "src.image.enhanced_creative_generator",
                    "create_enhanced_creative_generator",
                    "Enhanced Creative Generator",
                ),
                ModuleCheck::new(
                    "src.workflow.langgraph_integration",
                    "run_enhanced_workflow_from_streamlit",
                    "LangGraph Integration",
                ),
                ModuleCheck::new("utils.gpt_utils", "optimize_prompt_with_gpt4", "GPT Utils"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub headless: bool,
    pub port: u16,
    pub headless_flag: String,
    pub port_flag: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "streamlit".to_string(),
            args: vec![
                "run".to_string(),
                "streamlit_app_multi_prompt_enhanced_restructured.py".to_string(),
            ],
            headless: true,
            port: 8501,
            headless_flag: "--server.headless".to_string(),
            port_flag: "--server.port".to_string(),
        }
    }
}

impl ServerConfig {
    /// 完整命令行：程序 + 参数 + 无头/端口标志
    pub fn command_line(&self) -> Vec<String> {
        let mut cmd = Vec::with_capacity(self.args.len() + 5);
        cmd.push(self.program.clone());
        cmd.extend(self.args.iter().cloned());
        cmd.push(self.headless_flag.clone());
        cmd.push(self.headless.to_string());
        cmd.push(self.port_flag.clone());
        cmd.push(self.port.to_string());
        cmd
    }
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(p) => write!(f, "{} (--config)", p.display()),
            ConfigSource::Project(p) => write!(f, "{} (项目)", p.display()),
            ConfigSource::User(p) => write!(f, "{} (用户)", p.display()),
            ConfigSource::Defaults => write!(f, "内置默认值"),
        }
    }
}

impl LauncherConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .map_err(|e| LaunchError::Config(e.to_string()))?;
        let dotted = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .map_err(|e| LaunchError::Config(e.to_string()))?;

        if !ident.is_match(&self.environment.search_path_var) {
            return Err(LaunchError::Config(format!(
                "无效的搜索路径变量名: '{}'",
                self.environment.search_path_var
            )));
        }
        if self.preflight.interpreter.trim().is_empty() {
            return Err(LaunchError::Config("preflight.interpreter 不能为空".to_string()));
        }
        if self.preflight.checks.is_empty() {
            return Err(LaunchError::Config("preflight.checks 至少需要一项".to_string()));
        }
        for check in &self.preflight.checks {
            if !dotted.is_match(&check.module) {
                return Err(LaunchError::Config(format!(
                    "无效的模块路径: '{}'",
                    check.module
                )));
            }
            if !ident.is_match(&check.symbol) {
                return Err(LaunchError::Config(format!(
                    "无效的符号名: '{}' (模块 {})",
                    check.symbol, check.module
                )));
            }
        }
        if self.preflight.timeout_secs == 0 || self.activation.timeout_secs == 0 {
            return Err(LaunchError::Config("超时时间必须大于 0".to_string()));
        }
        if self.server.program.trim().is_empty() {
            return Err(LaunchError::Config("server.program 不能为空".to_string()));
        }
        if self.server.port == 0 {
            return Err(LaunchError::Config("server.port 必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 解析 TOML 文本并校验
    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: LauncherConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        let mut buf = toml::to_string_pretty(self)?;
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
        Ok(buf)
    }
}

/// 按查找顺序加载配置
pub fn load(explicit: Option<&Path>, project_root: &Path) -> Result<(LauncherConfig, ConfigSource)> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(LaunchError::FileNotFound(path.to_path_buf()));
        }
        let cfg = load_file(path)?;
        return Ok((cfg, ConfigSource::Explicit(path.to_path_buf())));
    }

    let project = project_root.join(PROJECT_CONFIG_FILE);
    if paths::file_exists(&project) {
        let cfg = load_file(&project)?;
        return Ok((cfg, ConfigSource::Project(project)));
    }

    if let Ok(user) = paths::user_config_path() {
        if paths::file_exists(&user) {
            let cfg = load_file(&user)?;
            return Ok((cfg, ConfigSource::User(user)));
        }
    }

    debug!("no config file found, using defaults");
    let cfg = LauncherConfig::default();
    cfg.validate()?;
    Ok((cfg, ConfigSource::Defaults))
}

fn load_file(path: &Path) -> Result<LauncherConfig> {
    debug!(path = %path.display(), "loading config");
    let content = paths::read_file(path)?;
    LauncherConfig::from_toml(&content).map_err(|e| match e {
        LaunchError::Toml(err) => LaunchError::Config(format!("{}: {}", path.display(), err)),
        other => other,
    })
}

/// 写入默认配置，已存在且未指定 force 时报错
pub fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(LaunchError::Config(format!(
            "配置文件已存在: {} (使用 --force 覆盖)",
            path.display()
        )));
    }
    let content = LauncherConfig::default().to_toml()?;
    paths::write_file_safe(path, &content)
}
