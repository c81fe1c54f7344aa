//! 启动预检流水线
//!
//! 严格按顺序执行：
//! 1. 配置环境（继承环境 + .env + 搜索路径变量）
//! 2. 可选的虚拟环境激活（脚本不存在则静默跳过）
//! 3. 模块导入检查（fail-fast 或 collect-all）
//! 4. 交接给服务进程并等待其退出
//!
//! 外部副作用都经过 trait 接缝：`Activator`、`ModuleProbe`、`ServerLauncher`、`Reporter`。

pub mod activation;
pub mod probe;
pub mod report;

use crate::config::{LauncherConfig, ServerConfig};
use crate::config::format::dotenv::DotenvParser;
use crate::error::{LaunchError, Result};
use crate::types::{FailurePolicy, ModuleCheck, PreflightReport, ProbeOutcome, Severity};
use crate::utils::env_merge::{EnvDelta, LaunchEnv};
use crate::utils::executor::ServerProcess;
use crate::utils::paths;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 执行激活脚本并返回它对环境造成的变化
pub trait Activator {
    fn activate(&self, script: &Path, env: &LaunchEnv, cwd: &Path) -> Result<EnvDelta>;
}

/// 检查单个模块能否导入
pub trait ModuleProbe {
    fn probe(&self, check: &ModuleCheck, env: &LaunchEnv, cwd: &Path) -> ProbeOutcome;
}

/// 启动服务并阻塞到其退出，返回退出码
pub trait ServerLauncher {
    fn launch(&self, server: &ServerConfig, env: &LaunchEnv, cwd: &Path) -> Result<i32>;
}

/// 面向操作者的状态行
pub trait Reporter {
    fn line(&self, severity: Severity, message: &str);
}

/// 默认的服务启动器：监管子进程
pub struct ProcessLauncher;

impl ServerLauncher for ProcessLauncher {
    fn launch(&self, server: &ServerConfig, env: &LaunchEnv, cwd: &Path) -> Result<i32> {
        let process = ServerProcess::start(&server.command_line(), env, cwd)?;
        debug!(pid = process.id(), "waiting for server process");
        process.wait()
    }
}

/// 流水线依赖的外部协作者
pub struct Hooks<'a> {
    pub activator: &'a dyn Activator,
    pub probe: &'a dyn ModuleProbe,
    pub launcher: &'a dyn ServerLauncher,
    pub reporter: &'a dyn Reporter,
}

/// 预检流水线
pub struct Sequencer<'a> {
    config: &'a LauncherConfig,
    project_root: PathBuf,
    base_env: LaunchEnv,
    overrides: Vec<(String, String)>,
    activation_enabled: bool,
}

impl<'a> Sequencer<'a> {
    pub fn new(config: &'a LauncherConfig, project_root: &Path) -> Self {
        Self {
            config,
            project_root: project_root.to_path_buf(),
            base_env: LaunchEnv::from_process(),
            overrides: Vec::new(),
            activation_enabled: config.activation.enabled,
        }
    }

    /// 替换继承环境（测试或受控启动时使用）
    pub fn with_base_env(mut self, env: LaunchEnv) -> Self {
        self.base_env = env;
        self
    }

    /// -e KEY=VALUE 覆盖，最后应用
    pub fn with_overrides(mut self, overrides: Vec<(String, String)>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_activation(mut self, enabled: bool) -> Self {
        self.activation_enabled = enabled;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// 搜索路径变量的最终取值：按配置顺序拼接，不去重
    pub fn search_path_value(&self) -> String {
        let resolved =
            paths::resolve_search_paths(&self.project_root, &self.config.environment.search_paths);
        paths::join_search_path(&resolved)
    }

    pub fn activation_script(&self) -> PathBuf {
        self.project_root.join(&self.config.activation.script)
    }

    /// 步骤 1：配置环境
    pub fn configure_environment(&self, reporter: &dyn Reporter) -> Result<LaunchEnv> {
        let mut env = self.base_env.clone();

        if let Some(dotenv) = &self.config.environment.dotenv {
            let path = self.project_root.join(dotenv);
            if paths::file_exists(&path) {
                let vars = DotenvParser::parse_file(&path)?;
                debug!(path = %path.display(), count = vars.len(), "loaded dotenv");
                reporter.line(
                    Severity::Info,
                    &format!("已加载 {} ({} 个变量)", path.display(), vars.len()),
                );
                env.extend(vars);
            }
        }

        let var = &self.config.environment.search_path_var;
        let value = self.search_path_value();
        reporter.line(Severity::Info, &format!("设置 {} = {}", var, value));
        env.set(var.clone(), value);

        Ok(env)
    }

    /// 步骤 2：激活虚拟环境（可选）
    ///
    /// 返回是否执行了激活。
    pub fn activate(&self, env: &mut LaunchEnv, hooks: &Hooks<'_>) -> Result<bool> {
        if !self.activation_enabled {
            debug!("activation disabled");
            return Ok(false);
        }

        let script = self.activation_script();
        if !paths::file_exists(&script) {
            debug!(script = %script.display(), "activation script absent, skipping");
            return Ok(false);
        }

        hooks
            .reporter
            .line(Severity::Info, &format!("激活虚拟环境: {}", script.display()));
        let delta = hooks.activator.activate(&script, env, &self.project_root)?;
        info!(set = delta.set.len(), removed = delta.removed.len(), "activation applied");
        env.apply(&delta);
        hooks.reporter.line(Severity::Success, "虚拟环境已激活");
        Ok(true)
    }

    /// 步骤 1 + 2 + 临时覆盖
    pub fn prepare(&self, hooks: &Hooks<'_>) -> Result<LaunchEnv> {
        let mut env = self.configure_environment(hooks.reporter)?;
        self.activate(&mut env, hooks)?;
        for (key, value) in &self.overrides {
            env.set(key.clone(), value.clone());
        }
        Ok(env)
    }

    /// 步骤 3：模块导入检查
    pub fn check(&self, env: &LaunchEnv, hooks: &Hooks<'_>) -> PreflightReport {
        let checks = &self.config.preflight.checks;
        let policy = self.config.preflight.policy;
        let mut report = PreflightReport::default();

        hooks.reporter.line(
            Severity::Info,
            &format!("检查 {} 个模块 ({})", checks.len(), policy),
        );

        for (index, check) in checks.iter().enumerate() {
            let outcome = hooks.probe.probe(check, env, &self.project_root);
            if outcome.is_ok() {
                hooks
                    .reporter
                    .line(Severity::Success, &format!("{} 导入成功", check.label));
            } else {
                warn!(module = %check.module, "module check failed");
                hooks.reporter.line(Severity::Error, &outcome.to_string());
            }

            let failed = !outcome.is_ok();
            report.outcomes.push(outcome);

            if failed && policy == FailurePolicy::FailFast {
                report.skipped = checks[index + 1..]
                    .iter()
                    .map(|c| c.module.clone())
                    .collect();
                break;
            }
        }

        report
    }

    /// 步骤 1–3，不启动服务
    pub fn preflight(&self, hooks: &Hooks<'_>) -> Result<(LaunchEnv, PreflightReport)> {
        let env = self.prepare(hooks)?;
        let report = self.check(&env, hooks);
        Ok((env, report))
    }

    /// 完整流水线：预检通过后交接给服务进程，返回其退出码
    pub fn run(&self, hooks: &Hooks<'_>) -> Result<i32> {
        let (env, report) = self.preflight(hooks)?;
        if !report.is_healthy() {
            return Err(LaunchError::Preflight(report));
        }

        let server = &self.config.server;
        hooks.reporter.line(
            Severity::Info,
            &format!(
                "🚀 启动服务: {} (端口 {}, headless={})",
                server.program, server.port, server.headless
            ),
        );
        hooks.launcher.launch(server, &env, &self.project_root)
    }
}
