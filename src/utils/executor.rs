//! 跨平台命令执行器
//!
//! 所有子进程都使用 `LaunchEnv` 作为完整环境（先清空再注入），
//! 工作目录固定为项目根目录。
//! - `CommandExecutor::capture`：带超时、捕获输出（激活脚本、模块探测）
//! - `ServerProcess`：继承标准流的长期子进程，负责等待和退出码透传

use crate::error::{LaunchError, Result};
use crate::exit_codes;
use crate::utils::env_merge::LaunchEnv;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// 捕获的子进程输出
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|s| s.success())
    }

    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// stderr 最后一个非空行，通常是异常摘要
    pub fn last_stderr_line(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}

/// 跨平台命令执行器
pub struct CommandExecutor;

impl CommandExecutor {
    fn build(program: &str, args: &[String], env: &LaunchEnv, cwd: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).env_clear().envs(env.vars()).current_dir(cwd);
        cmd
    }

    fn spawn_error(program: &str, err: std::io::Error) -> LaunchError {
        if err.kind() == std::io::ErrorKind::NotFound {
            LaunchError::CommandNotFound(format!(
                "{}: {} (请确保命令在 PATH 中或使用完整路径)",
                program, err
            ))
        } else {
            LaunchError::CommandExecutionFailed(format!("{}: {}", program, err))
        }
    }

    /// 执行命令并捕获输出，超时后强制结束
    ///
    /// # 返回
    /// 无法启动时返回错误；其余情况（包括超时）都返回 `CapturedOutput`
    pub fn capture(
        program: &str,
        args: &[String],
        env: &LaunchEnv,
        cwd: &Path,
        timeout: Duration,
    ) -> Result<CapturedOutput> {
        let mut cmd = Self::build(program, args, env, cwd);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(program, ?args, "spawning captured command");
        let mut child = cmd.spawn().map_err(|e| Self::spawn_error(program, e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_handle = thread::spawn(move || read_stream(stdout));
        let stderr_handle = thread::spawn(move || read_stream(stderr));

        let mut timed_out = false;
        let status = match child.wait_timeout(timeout)? {
            Some(status) => Some(status),
            None => {
                warn!(program, timeout_ms = timeout.as_millis() as u64, "command timed out, killing");
                timed_out = true;
                child.kill()?;
                child.wait()?;
                None
            }
        };

        // 超时后孙进程可能仍持有管道写端，读取线程直接放弃，不再等待
        let (stdout, stderr) = if timed_out {
            drop(stdout_handle);
            drop(stderr_handle);
            (String::new(), String::new())
        } else {
            (
                stdout_handle.join().unwrap_or_default(),
                stderr_handle.join().unwrap_or_default(),
            )
        };

        debug!(program, exit_code = ?status.and_then(|s| s.code()), timed_out, "command finished");
        Ok(CapturedOutput {
            status,
            stdout,
            stderr,
            timed_out,
        })
    }
}

fn read_stream<R: Read>(stream: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut s) = stream {
        let _ = s.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// 被监管的服务子进程
///
/// 继承标准流；终端中断信号直接送达子进程（同一前台进程组），
/// 启动器只负责等待并透传退出码。
pub struct ServerProcess {
    child: Child,
    program: String,
}

impl ServerProcess {
    pub fn start(command: &[String], env: &LaunchEnv, cwd: &Path) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| LaunchError::CommandExecutionFailed("命令不能为空".to_string()))?;

        let mut cmd = CommandExecutor::build(program, args, env, cwd);
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd
            .spawn()
            .map_err(|e| CommandExecutor::spawn_error(program, e))?;
        info!(program = %program, pid = child.id(), "server process started");

        Ok(Self {
            child,
            program: program.clone(),
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// 阻塞直到子进程退出，返回应透传的退出码
    pub fn wait(mut self) -> Result<i32> {
        let status = self.child.wait()?;
        let code = exit_code_of(&status);
        info!(program = %self.program, code, "server process exited");
        Ok(code)
    }

    /// 强制结束子进程
    #[cfg(test)]
    pub fn terminate(mut self) -> Result<i32> {
        warn!(program = %self.program, "terminating server process");
        self.child.kill()?;
        self.wait()
    }
}

/// 退出状态 → 退出码；Unix 上被信号终止时为 128 + 信号编号
pub fn exit_code_of(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return exit_codes::SIGNAL_BASE + signal;
        }
    }
    exit_codes::PREFLIGHT_FAILED
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Instant;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    fn env_with(key: &str, value: &str) -> LaunchEnv {
        let mut env = LaunchEnv::from_process();
        env.set(key, value);
        env
    }

    #[test]
    #[serial]
    fn test_capture_uses_launch_env() {
        let env = env_with("PREFLIGHT_TEST_VAR", "from-launch-env");
        let out = CommandExecutor::capture(
            "sh",
            &sh("echo $PREFLIGHT_TEST_VAR; echo oops >&2; exit 3"),
            &env,
            Path::new("."),
            Duration::from_secs(10),
        )
        .unwrap();

        assert_eq!(out.stdout.trim(), "from-launch-env");
        assert_eq!(out.last_stderr_line(), "oops");
        assert_eq!(out.code(), Some(3));
        assert!(!out.success());
    }

    #[test]
    #[serial]
    fn test_capture_times_out() {
        let env = LaunchEnv::from_process();
        let out = CommandExecutor::capture(
            "sh",
            &sh("exec sleep 5"),
            &env,
            Path::new("."),
            Duration::from_millis(200),
        )
        .unwrap();

        assert!(out.timed_out);
        assert!(!out.success());
    }

    #[test]
    #[serial]
    fn test_capture_timeout_ignores_grandchild_holding_pipes() {
        let env = LaunchEnv::from_process();
        let started = Instant::now();
        let out = CommandExecutor::capture(
            "sh",
            &sh("sleep 5; echo done"),
            &env,
            Path::new("."),
            Duration::from_millis(300),
        )
        .unwrap();

        assert!(out.timed_out);
        assert!(out.stdout.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    #[serial]
    fn test_capture_missing_program() {
        let env = LaunchEnv::from_process();
        let result = CommandExecutor::capture(
            "definitely-not-a-real-program-xyz",
            &[],
            &env,
            Path::new("."),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(LaunchError::CommandNotFound(_))));
    }

    #[test]
    #[serial]
    fn test_server_exit_code_is_forwarded() {
        let env = LaunchEnv::from_process();
        let command = vec!["sh".to_string(), "-c".to_string(), "exit 7".to_string()];
        let server = ServerProcess::start(&command, &env, Path::new(".")).unwrap();
        assert_eq!(server.wait().unwrap(), 7);
    }

    #[test]
    #[serial]
    fn test_server_killed_by_signal_maps_to_128_plus() {
        let env = LaunchEnv::from_process();
        let command = vec!["sh".to_string(), "-c".to_string(), "exec sleep 30".to_string()];
        let server = ServerProcess::start(&command, &env, Path::new(".")).unwrap();
        // SIGKILL = 9
        assert_eq!(server.terminate().unwrap(), 137);
    }

    #[test]
    #[serial]
    fn test_empty_server_command_is_error() {
        let env = LaunchEnv::from_process();
        assert!(ServerProcess::start(&[], &env, Path::new(".")).is_err());
    }
}
