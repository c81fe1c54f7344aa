//! 模块导入探测
//!
//! 每个模块在独立的解释器进程中执行 `from <module> import <symbol>`，
//! 只验证可导入性，不调用符号。模块路径和符号名在加载配置时已校验为合法标识符。

use super::ModuleProbe;
use crate::error::LaunchError;
use crate::types::{FailureReason, ModuleCheck, ProbeOutcome};
use crate::utils::env_merge::LaunchEnv;
use crate::utils::executor::{CapturedOutput, CommandExecutor};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// 通过解释器子进程探测
pub struct InterpreterProbe {
    interpreter: String,
    timeout: Duration,
}

impl InterpreterProbe {
    pub fn new(interpreter: &str, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.to_string(),
            timeout,
        }
    }

    /// 探测代码
    pub fn import_statement(check: &ModuleCheck) -> String {
        format!("from {} import {}", check.module, check.symbol)
    }

    /// 根据进程结果判定失败原因
    fn classify(check: &ModuleCheck, output: &CapturedOutput) -> ProbeOutcome {
        if output.timed_out {
            return ProbeOutcome::failed(&check.module, &check.label, FailureReason::Timeout, "");
        }
        if output.success() {
            return ProbeOutcome::passed(&check.module, &check.label);
        }

        let detail = output.last_stderr_line();
        let reason = if detail.contains("ModuleNotFoundError") {
            FailureReason::ModuleNotFound
        } else if detail.contains("ImportError") {
            FailureReason::ImportFailed
        } else {
            FailureReason::Crashed {
                code: output.code(),
            }
        };
        ProbeOutcome::failed(&check.module, &check.label, reason, detail)
    }
}

impl ModuleProbe for InterpreterProbe {
    fn probe(&self, check: &ModuleCheck, env: &LaunchEnv, cwd: &Path) -> ProbeOutcome {
        let args = vec!["-c".to_string(), Self::import_statement(check)];
        debug!(module = %check.module, interpreter = %self.interpreter, "probing module");

        match CommandExecutor::capture(&self.interpreter, &args, env, cwd, self.timeout) {
            Ok(output) => Self::classify(check, &output),
            Err(LaunchError::CommandNotFound(msg)) | Err(LaunchError::CommandExecutionFailed(msg)) => {
                ProbeOutcome::failed(
                    &check.module,
                    &check.label,
                    FailureReason::InterpreterUnavailable,
                    &msg,
                )
            }
            Err(err) => ProbeOutcome::failed(
                &check.module,
                &check.label,
                FailureReason::InterpreterUnavailable,
                &err.to_string(),
            ),
        }
    }
}
