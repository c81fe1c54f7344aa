//! 核心数据结构定义 (表达原则：用数据结构表达逻辑)

use serde::{Deserialize, Serialize};
use std::fmt;

/// 状态行的严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// 视觉标记
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️ ",
            Severity::Success => "✅",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        }
    }
}

/// 模块检查失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// 第一个失败即停止，剩余模块不再检查
    #[default]
    FailFast,
    /// 检查全部模块后统一报告
    CollectAll,
}

impl FailurePolicy {
    /// 从字符串转换
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "failfast" => Some(FailurePolicy::FailFast),
            "collect-all" | "collect" | "all" => Some(FailurePolicy::CollectAll),
            _ => None,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::CollectAll => write!(f, "collect-all"),
        }
    }
}

/// 一项模块导入检查：模块路径 + 需要存在的符号 + 展示名称
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCheck {
    pub module: String,
    pub symbol: String,
    pub label: String,
}

impl ModuleCheck {
    pub fn new(module: &str, symbol: &str, label: &str) -> Self {
        Self {
            module: module.to_string(),
            symbol: symbol.to_string(),
            label: label.to_string(),
        }
    }
}

/// 模块检查失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureReason {
    /// 模块本身无法定位
    ModuleNotFound,
    /// 模块找到但导入过程出错（含符号缺失）
    ImportFailed,
    /// 探测进程超时
    Timeout,
    /// 解释器无法启动
    InterpreterUnavailable,
    /// 探测进程以未知方式失败
    Crashed { code: Option<i32> },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ModuleNotFound => write!(f, "模块未找到"),
            FailureReason::ImportFailed => write!(f, "导入失败"),
            FailureReason::Timeout => write!(f, "检查超时"),
            FailureReason::InterpreterUnavailable => write!(f, "解释器不可用"),
            FailureReason::Crashed { code: Some(code) } => write!(f, "探测进程退出码 {}", code),
            FailureReason::Crashed { code: None } => write!(f, "探测进程异常终止"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub reason: FailureReason,
    pub detail: String,
}

/// 单个模块的检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub module: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    pub fn passed(module: &str, label: &str) -> Self {
        Self {
            module: module.to_string(),
            label: label.to_string(),
            failure: None,
        }
    }

    pub fn failed(module: &str, label: &str, reason: FailureReason, detail: &str) -> Self {
        Self {
            module: module.to_string(),
            label: label.to_string(),
            failure: Some(ProbeFailure {
                reason,
                detail: detail.to_string(),
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            None => write!(f, "{} ({})", self.label, self.module),
            Some(failure) if failure.detail.is_empty() => {
                write!(f, "{} ({}): {}", self.label, self.module, failure.reason)
            }
            Some(failure) => write!(
                f,
                "{} ({}): {}: {}",
                self.label, self.module, failure.reason, failure.detail
            ),
        }
    }
}

/// 一次预检的有序结果，只在本次运行内有效
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightReport {
    pub outcomes: Vec<ProbeOutcome>,
    /// fail-fast 策略下未执行的模块
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl PreflightReport {
    pub fn from_outcomes(outcomes: Vec<ProbeOutcome>) -> Self {
        Self {
            outcomes,
            skipped: Vec::new(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.outcomes.iter().all(ProbeOutcome::is_ok) && self.skipped.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn first_failure(&self) -> Option<&ProbeOutcome> {
        self.failures().next()
    }
}

impl fmt::Display for PreflightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed: Vec<&str> = self.failures().map(|o| o.module.as_str()).collect();
        write!(f, "{} 个模块检查失败: {}", failed.len(), failed.join(", "))
    }
}

/// 输出格式类型
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    TEXT,
    ENV,
    JSON,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "j" => OutputFormat::JSON,
            "env" | "e" => OutputFormat::ENV,
            _ => OutputFormat::TEXT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!(FailurePolicy::parse("fail-fast"), Some(FailurePolicy::FailFast));
        assert_eq!(FailurePolicy::parse("COLLECT-ALL"), Some(FailurePolicy::CollectAll));
        assert_eq!(FailurePolicy::parse("sometimes"), None);
    }

    #[test]
    fn test_report_with_skipped_modules_is_not_healthy() {
        let mut report =
            PreflightReport::from_outcomes(vec![ProbeOutcome::passed("a.b", "A")]);
        assert!(report.is_healthy());

        report.skipped.push("c.d".to_string());
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_report_lists_failures_in_order() {
        let report = PreflightReport::from_outcomes(vec![
            ProbeOutcome::failed("x", "X", FailureReason::ModuleNotFound, ""),
            ProbeOutcome::passed("y", "Y"),
            ProbeOutcome::failed("z", "Z", FailureReason::Timeout, ""),
        ]);

        let failed: Vec<&str> = report.failures().map(|o| o.module.as_str()).collect();
        assert_eq!(failed, vec!["x", "z"]);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.to_string(), "2 个模块检查失败: x, z");
    }

    #[test]
    fn test_outcome_json_omits_failure_when_passed() {
        let json = serde_json::to_string(&ProbeOutcome::passed("m", "M")).unwrap();
        assert!(!json.contains("failure"));

        let failed = ProbeOutcome::failed("m", "M", FailureReason::Crashed { code: Some(3) }, "x");
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"kind\":\"crashed\""));
        assert!(json.contains("\"code\":3"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from("json"), OutputFormat::JSON);
        assert_eq!(OutputFormat::from("env"), OutputFormat::ENV);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::TEXT);
    }
}
