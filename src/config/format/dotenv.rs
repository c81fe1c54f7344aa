//! .env 格式解析器 (简单原则：透明的文本解析)

use crate::error::{LaunchError, Result};
use std::path::Path;

/// .env 格式解析器
pub struct DotenvParser;

impl DotenvParser {
    /// 解析 .env 文件内容，保持出现顺序
    ///
    /// 规则：
    /// - 忽略空行和以 # 开头的注释行
    /// - 格式：KEY=VALUE，可带 `export ` 前缀
    /// - 成对的单引号或双引号会被去掉
    /// - 支持多行值（以 \ 结尾）
    ///
    /// # Errors
    ///
    /// Returns parsing errors for invalid format.
    pub fn parse(content: &str) -> Result<Vec<(String, String)>> {
        let mut vars = Vec::new();

        let lines: Vec<&str> = content.lines().collect();
        let mut line_num = 0;

        while line_num < lines.len() {
            let line = lines[line_num].trim();

            if line.is_empty() || line.starts_with('#') {
                line_num += 1;
                continue;
            }

            let mut value_end = line_num;
            let mut complete_line = line.to_string();

            while complete_line.ends_with('\\') && value_end + 1 < lines.len() {
                complete_line.pop();
                value_end += 1;
                complete_line.push_str(lines[value_end].trim());
            }

            line_num = value_end + 1;

            let body = complete_line
                .strip_prefix("export ")
                .unwrap_or(&complete_line);

            if let Some((key, value)) = body.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(LaunchError::Parse(format!("空的键名在行 '{complete_line}'")));
                }
                vars.push((key.to_string(), unquote(value.trim()).to_string()));
            }
            // 非 KEY=VALUE 行直接跳过，保持兼容性
        }

        Ok(vars)
    }

    /// 读取并解析 .env 文件
    pub fn parse_file(path: &Path) -> Result<Vec<(String, String)>> {
        if !path.exists() {
            return Err(LaunchError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
