//! 测试工具模块
//!
//! 提供统一的测试环境管理：环境变量/工作目录守卫、临时项目、各 trait 的记录型替身

use crate::config::ServerConfig;
use crate::error::Result;
use crate::preflight::{Activator, ModuleProbe, Reporter, ServerLauncher};
use crate::types::{FailureReason, ModuleCheck, ProbeOutcome, Severity};
use crate::utils::env_merge::{EnvDelta, LaunchEnv};
use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 环境变量守卫 - 自动清理
pub struct EnvGuard {
    original_vars: HashMap<String, String>,
}

impl EnvGuard {
    /// 创建一个新的环境守卫，记录当前环境变量
    pub fn new() -> Self {
        let original_vars: HashMap<String, String> = env::vars().collect();
        Self { original_vars }
    }

    /// 设置测试环境变量（自动包装为 unsafe）
    pub fn set_var(&self, key: &str, value: &str) {
        unsafe {
            env::set_var(key, value);
        }
    }

    fn remove_var(&self, key: &str) {
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvGuard {
    /// 释放时恢复原始环境变量
    fn drop(&mut self) {
        let current_vars: Vec<String> = env::vars().map(|(k, _)| k).collect();
        for key in current_vars {
            if !self.original_vars.contains_key(&key) {
                self.remove_var(&key);
            }
        }

        for (key, value) in &self.original_vars {
            if env::var(key).ok().as_deref() != Some(value.as_str()) {
                self.set_var(key, value);
            }
        }
    }
}

/// 切换工作目录并在释放时恢复
pub struct TempDirGuard {
    temp_dir: TempDir,
    original_dir: PathBuf,
}

impl TempDirGuard {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(&temp_dir).unwrap();

        Self {
            temp_dir,
            original_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        env::set_current_dir(&self.original_dir).unwrap();
    }
}

/// 临时项目目录
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// 写入文件（自动创建父目录）
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// 写入可执行脚本
    #[cfg(unix)]
    pub fn write_executable(&self, rel: &str, content: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write_file(rel, content);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// 假的 python：`-c "from <m> import <s>"`，`missing` 中的模块报 ModuleNotFoundError
    #[cfg(unix)]
    pub fn fake_python(&self, missing: &[&str]) -> PathBuf {
        let mut script = String::from("#!/bin/sh\ncase \"$2\" in\n");
        for module in missing {
            script.push_str(&format!(
                "  \"from {m} import \"*) echo \"ModuleNotFoundError: No module named '{m}'\" >&2; exit 1;;\n",
                m = module
            ));
        }
        script.push_str("esac\nexit 0\n");
        self.write_executable("bin/python", &script)
    }
}

/// 记录调用顺序的激活替身，默认设置 VIRTUAL_ENV=/fake/venv
pub struct FakeActivator<'a> {
    events: &'a RefCell<Vec<String>>,
    set: Vec<(String, String)>,
}

impl<'a> FakeActivator<'a> {
    pub fn new(events: &'a RefCell<Vec<String>>) -> Self {
        Self::setting(events, &[("VIRTUAL_ENV", "/fake/venv")])
    }

    /// 激活时设置指定变量
    pub fn setting(events: &'a RefCell<Vec<String>>, vars: &[(&str, &str)]) -> Self {
        Self {
            events,
            set: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Activator for FakeActivator<'_> {
    fn activate(&self, _script: &Path, _env: &LaunchEnv, _cwd: &Path) -> Result<EnvDelta> {
        self.events.borrow_mut().push("activate".to_string());
        Ok(EnvDelta {
            set: self.set.clone(),
            removed: Vec::new(),
        })
    }
}

/// 模块探测替身：`failing` 中的模块返回 ModuleNotFound
pub struct FakeProbe<'a> {
    events: &'a RefCell<Vec<String>>,
    failing: Vec<String>,
}

impl<'a> FakeProbe<'a> {
    pub fn new(events: &'a RefCell<Vec<String>>, failing: &[&str]) -> Self {
        Self {
            events,
            failing: failing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ModuleProbe for FakeProbe<'_> {
    fn probe(&self, check: &ModuleCheck, _env: &LaunchEnv, _cwd: &Path) -> ProbeOutcome {
        self.events
            .borrow_mut()
            .push(format!("probe:{}", check.module));
        if self.failing.contains(&check.module) {
            ProbeOutcome::failed(
                &check.module,
                &check.label,
                FailureReason::ModuleNotFound,
                &format!("No module named '{}'", check.module),
            )
        } else {
            ProbeOutcome::passed(&check.module, &check.label)
        }
    }
}

/// 服务启动替身：记录配置和环境，返回固定退出码
pub struct FakeLauncher<'a> {
    events: &'a RefCell<Vec<String>>,
    code: i32,
    launches: RefCell<Vec<(ServerConfig, LaunchEnv)>>,
}

impl<'a> FakeLauncher<'a> {
    pub fn new(events: &'a RefCell<Vec<String>>, code: i32) -> Self {
        Self {
            events,
            code,
            launches: RefCell::new(Vec::new()),
        }
    }

    pub fn launches(&self) -> Vec<ServerConfig> {
        self.launches
            .borrow()
            .iter()
            .map(|(server, _)| server.clone())
            .collect()
    }

    pub fn last_env_value(&self, key: &str) -> Option<String> {
        self.launches
            .borrow()
            .last()
            .and_then(|(_, env)| env.get(key).map(str::to_string))
    }
}

impl ServerLauncher for FakeLauncher<'_> {
    fn launch(&self, server: &ServerConfig, env: &LaunchEnv, _cwd: &Path) -> Result<i32> {
        self.events.borrow_mut().push("launch".to_string());
        self.launches
            .borrow_mut()
            .push((server.clone(), env.clone()));
        Ok(self.code)
    }
}

/// 收集状态行
#[derive(Default)]
pub struct RecordingReporter {
    lines: RefCell<Vec<(Severity, String)>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn line(&self, severity: Severity, message: &str) {
        self.lines
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_guard_cleanup() {
        {
            let guard = EnvGuard::new();
            guard.set_var("PREFLIGHT_GUARD_VAR", "x");
            assert_eq!(env::var("PREFLIGHT_GUARD_VAR").unwrap(), "x");
        }
        assert!(env::var("PREFLIGHT_GUARD_VAR").is_err());
    }

    #[test]
    #[serial]
    fn test_temp_dir_guard_restores_cwd() {
        let original = env::current_dir().unwrap();
        {
            let guard = TempDirGuard::new();
            assert_eq!(
                env::current_dir().unwrap().canonicalize().unwrap(),
                guard.path().canonicalize().unwrap()
            );
        }
        assert_eq!(env::current_dir().unwrap(), original);
    }

    #[test]
    fn test_project_write_file_creates_dirs() {
        let project = TestProject::new();
        let path = project.write_file("venv/bin/activate", "x");
        assert!(path.exists());
    }
}
