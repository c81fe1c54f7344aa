//! 虚拟环境激活
//!
//! 激活脚本只能修改执行它的 shell 的环境，因此在子 shell 中 source 脚本，
//! 再导出完整环境，与执行前的 `LaunchEnv` 求差得到变化。

use super::Activator;
use crate::error::{LaunchError, Result};
use crate::utils::env_merge::{EnvDelta, EnvMerger, LaunchEnv};
use crate::utils::executor::CommandExecutor;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// shell 自身会改动的变量，不算激活带来的变化
const SHELL_NOISE: &[&str] = &["_", "SHLVL", "PWD", "OLDPWD", "PS1", "PROMPT"];

/// 通过系统 shell 执行激活脚本
pub struct ShellActivator {
    timeout: Duration,
}

impl ShellActivator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn shell_command(script: &Path) -> (String, Vec<String>) {
        let script = script.to_string_lossy().into_owned();
        if cfg!(windows) {
            (
                "cmd".to_string(),
                vec![
                    "/C".to_string(),
                    "call".to_string(),
                    script,
                    ">nul".to_string(),
                    "&&".to_string(),
                    "set".to_string(),
                ],
            )
        } else {
            (
                "sh".to_string(),
                vec![
                    "-c".to_string(),
                    ". \"$1\" >/dev/null && env".to_string(),
                    "preflight-activate".to_string(),
                    script,
                ],
            )
        }
    }
}

impl Activator for ShellActivator {
    fn activate(&self, script: &Path, env: &LaunchEnv, cwd: &Path) -> Result<EnvDelta> {
        let (program, args) = Self::shell_command(script);
        let output = CommandExecutor::capture(&program, &args, env, cwd, self.timeout)?;

        if output.timed_out {
            return Err(LaunchError::Activation(format!(
                "{} 超过 {:?} 未完成",
                script.display(),
                self.timeout
            )));
        }
        if !output.success() {
            return Err(LaunchError::Activation(format!(
                "{}: {}",
                script.display(),
                output.last_stderr_line()
            )));
        }

        let mut after = EnvMerger::parse_env_dump(&output.stdout);
        let mut before = env.snapshot();
        for key in SHELL_NOISE {
            after.remove(*key);
            before.remove(*key);
        }

        let delta = EnvMerger::diff(&before, &after);
        debug!(?delta, "activation delta");
        Ok(delta)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use crate::test_utils::TestProject;
    use std::time::Instant;

    fn base_env() -> LaunchEnv {
        let mut env = LaunchEnv::from_process();
        env.set("PREFLIGHT_DROP_ME", "1");
        env
    }

    #[test]
    #[serial]
    fn test_activation_captures_exports_and_unsets() {
        let project = TestProject::new();
        project.write_file(
            "venv/bin/activate",
            "echo 'activating'\n\
             VIRTUAL_ENV=\"$PWD/venv\"\n\
             export VIRTUAL_ENV\n\
             PATH=\"$VIRTUAL_ENV/bin:$PATH\"\n\
             export PATH\n\
             unset PREFLIGHT_DROP_ME\n",
        );
        let activator = ShellActivator::new(Duration::from_secs(10));
        let env = base_env();

        let delta = activator
            .activate(&project.root().join("venv/bin/activate"), &env, project.root())
            .unwrap();

        let virtual_env = delta
            .set
            .iter()
            .find(|(k, _)| k == "VIRTUAL_ENV")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert!(virtual_env.ends_with("/venv"));
        assert!(delta.set.iter().any(|(k, v)| k == "PATH" && v.contains("/venv/bin:")));
        assert_eq!(delta.removed, vec!["PREFLIGHT_DROP_ME".to_string()]);
        assert!(!delta.set.iter().any(|(k, _)| SHELL_NOISE.contains(&k.as_str())));
    }

    #[test]
    #[serial]
    fn test_failing_activation_is_error() {
        let project = TestProject::new();
        project.write_file("venv/bin/activate", "echo 'broken venv' >&2\nfalse\n");
        let activator = ShellActivator::new(Duration::from_secs(10));

        let result = activator.activate(
            &project.root().join("venv/bin/activate"),
            &base_env(),
            project.root(),
        );

        match result {
            Err(LaunchError::Activation(msg)) => assert!(msg.contains("broken venv")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_slow_activation_times_out_promptly() {
        let project = TestProject::new();
        project.write_file("venv/bin/activate", "sleep 5\n");
        let activator = ShellActivator::new(Duration::from_millis(300));
        let started = Instant::now();

        let result = activator.activate(
            &project.root().join("venv/bin/activate"),
            &base_env(),
            project.root(),
        );

        assert!(matches!(result, Err(LaunchError::Activation(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    #[serial]
    fn test_noop_activation_has_empty_delta() {
        let project = TestProject::new();
        project.write_file("venv/bin/activate", "# nothing\n");
        let activator = ShellActivator::new(Duration::from_secs(10));

        let delta = activator
            .activate(
                &project.root().join("venv/bin/activate"),
                &LaunchEnv::from_process(),
                project.root(),
            )
            .unwrap();

        assert!(delta.is_empty(), "unexpected delta: {:?}", delta);
    }
}
