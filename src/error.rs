//! 错误处理模块 (修复原则：明确抛出异常)

use crate::exit_codes;
use crate::types::PreflightReport;
use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("文件IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析错误: {0}")]
    Parse(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("文件不存在: {0}")]
    FileNotFound(PathBuf),

    #[error("JSON序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML序列化错误: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("环境变量解析错误: {0}")]
    EnvParseError(String),

    #[error("命令未找到: {0}")]
    CommandNotFound(String),

    #[error("命令执行失败: {0}")]
    CommandExecutionFailed(String),

    #[error("虚拟环境激活失败: {0}")]
    Activation(String),

    #[error("预检失败: {0}")]
    Preflight(PreflightReport),
}

/// 详细的错误报告函数 (透明原则)
impl LaunchError {
    /// 报告错误，支持详细/安静模式
    /// verbose = true: 详细错误链
    /// verbose = false: 关键信息，安静模式
    pub fn report(&self, verbose: bool) {
        if verbose {
            eprintln!("❌ 错误: {}", self);

            if let Some(source) = self.source() {
                eprintln!("  └─ 原因: {}", source);
                let mut current = source.source();
                while let Some(next) = current {
                    eprintln!("     └─ {}", next);
                    current = next.source();
                }
            }

            if let LaunchError::Preflight(report) = self {
                for failure in report.failures() {
                    eprintln!("  └─ {}", failure);
                }
            }
        } else {
            match self {
                LaunchError::Io(err) => eprintln!("❌ 文件错误: {}", err),
                LaunchError::FileNotFound(path) => {
                    eprintln!("❌ 文件不存在: {}", path.display())
                }
                LaunchError::Preflight(report) => match report.first_failure() {
                    Some(failure) => eprintln!("❌ {}", failure),
                    None => eprintln!("❌ 预检失败"),
                },
                _ => eprintln!("❌ 错误: {}", self),
            }
        }
    }

    /// 启动器自身的错误统一映射为预检失败退出码
    pub fn exit_code(&self) -> i32 {
        exit_codes::PREFLIGHT_FAILED
    }
}

/// 简化 Result 类型别名
pub type Result<T> = std::result::Result<T, LaunchError>;
