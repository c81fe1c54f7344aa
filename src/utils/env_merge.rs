//! 启动环境构建器
//!
//! 优先级（从低到高）：
//! 1. 继承的进程环境
//! 2. .env 文件
//! 3. 搜索路径变量
//! 4. 虚拟环境激活带来的变化
//! 5. 临时变量 -e KEY=VALUE（最高）
//!
//! 启动器从不修改自身进程的环境，所有变化都记录在 `LaunchEnv` 中，
//! 由子进程（激活脚本、模块探测、服务进程）显式接收。

use crate::error::{LaunchError, Result};
use std::collections::BTreeMap;

/// 子进程使用的完整环境
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnv {
    vars: BTreeMap<String, String>,
    inherited: BTreeMap<String, String>,
}

impl LaunchEnv {
    /// 以给定的继承环境为基础
    pub fn inherit<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let inherited: BTreeMap<String, String> = vars.into_iter().collect();
        Self {
            vars: inherited.clone(),
            inherited,
        }
    }

    /// 以当前进程环境为基础
    pub fn from_process() -> Self {
        Self::inherit(std::env::vars())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn extend<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.vars.extend(vars);
    }

    /// 应用一次环境变化
    pub fn apply(&mut self, delta: &EnvDelta) {
        for key in &delta.removed {
            self.vars.remove(key);
        }
        for (key, value) in &delta.set {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// 传给子进程的全部变量
    pub fn vars(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    /// 相对继承环境新增或修改过的变量
    pub fn changed(&self) -> Vec<(&String, &String)> {
        self.vars
            .iter()
            .filter(|(k, v)| self.inherited.get(*k) != Some(*v))
            .collect()
    }

    /// 相对继承环境被移除的变量
    pub fn removed(&self) -> Vec<&String> {
        self.inherited
            .keys()
            .filter(|k| !self.vars.contains_key(*k))
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars.clone()
    }
}

/// 两次环境快照之间的差异
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDelta {
    pub set: Vec<(String, String)>,
    pub removed: Vec<String>,
}

impl EnvDelta {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }
}

/// 环境变量合并器
pub struct EnvMerger;

impl EnvMerger {
    /// 解析临时环境变量参数
    ///
    /// # 输入
    /// `["DB_HOST=localhost", "DB_PORT=5432"]`
    ///
    /// # 输出
    /// `[("DB_HOST", "localhost"), ("DB_PORT", "5432")]`
    pub fn parse_temp_vars(env_args: &[String]) -> Result<Vec<(String, String)>> {
        let mut vars = Vec::new();

        for arg in env_args {
            match arg.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    // trim 键，trim 值的左边空格但保留右边空格
                    vars.push((key.trim().to_string(), value.trim_start().to_string()));
                }
                _ => {
                    return Err(LaunchError::EnvParseError(format!(
                        "无效的环境变量格式 '{}'，应为 KEY=VALUE",
                        arg
                    )));
                }
            }
        }

        Ok(vars)
    }

    /// 解析 `env` / `set` 命令输出
    ///
    /// 不含 `=` 的行视为上一个值的续行。
    pub fn parse_env_dump(output: &str) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        let mut last_key: Option<String> = None;

        for line in output.lines() {
            let line = line.trim_end_matches('\r');
            // Windows `set` 会输出 "=C:=C:\..." 这类隐藏变量
            if line.starts_with('=') {
                last_key = None;
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) if !key.is_empty() && !key.contains(char::is_whitespace) => {
                    vars.insert(key.to_string(), value.to_string());
                    last_key = Some(key.to_string());
                }
                _ => {
                    if let Some(value) = last_key.as_ref().and_then(|k| vars.get_mut(k)) {
                        value.push('\n');
                        value.push_str(line);
                    }
                }
            }
        }

        vars
    }

    /// 计算 before → after 的变化
    pub fn diff(before: &BTreeMap<String, String>, after: &BTreeMap<String, String>) -> EnvDelta {
        let set = after
            .iter()
            .filter(|(k, v)| before.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let removed = before
            .keys()
            .filter(|k| !after.contains_key(*k))
            .cloned()
            .collect();

        EnvDelta { set, removed }
    }
}
