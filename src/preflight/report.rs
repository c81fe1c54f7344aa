//! 状态行输出与预检报告渲染

use super::Reporter;
use crate::error::Result;
use crate::types::{PreflightReport, Severity};

/// 终端输出：错误写 stderr，其余写 stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// 只输出错误
    pub quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn line(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => eprintln!("{} {}", severity.icon(), message),
            _ if self.quiet => {}
            _ => println!("{} {}", severity.icon(), message),
        }
    }
}

/// 预检摘要行
pub fn summary(report: &PreflightReport) -> (Severity, String) {
    if report.is_healthy() {
        (
            Severity::Success,
            format!("全部 {} 个模块检查通过", report.outcomes.len()),
        )
    } else {
        let failed = report.failures().count();
        let mut msg = format!(
            "{} 个模块通过，{} 个失败",
            report.passed_count(),
            failed
        );
        if !report.skipped.is_empty() {
            msg.push_str(&format!("，{} 个未检查", report.skipped.len()));
        }
        (Severity::Error, msg)
    }
}

/// JSON 格式的预检报告
pub fn render_json(report: &PreflightReport) -> Result<String> {
    let value = serde_json::json!({
        "healthy": report.is_healthy(),
        "passed": report.passed_count(),
        "outcomes": report.outcomes,
        "skipped": report.skipped,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
