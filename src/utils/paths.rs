//! 跨平台路径处理工具 (传统原则：常识性接口设计)

use crate::error::{LaunchError, Result};
use std::path::{Path, PathBuf};

/// 平台路径分隔符
#[cfg(windows)]
pub const PATH_DELIMITER: char = ';';
#[cfg(not(windows))]
pub const PATH_DELIMITER: char = ':';

/// 确定项目根目录：显式指定或当前目录，统一为绝对路径
pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| LaunchError::Config(format!("无法获取当前目录: {}", e)))?,
    };
    std::path::absolute(&root)
        .map_err(|e| LaunchError::Config(format!("无法解析项目目录 {}: {}", root.display(), e)))
}

/// 把配置中的搜索目录解析为绝对路径
///
/// "." 或空串表示根目录本身；绝对路径原样保留。
/// 不检查目录是否存在，不去重，不改变顺序。
pub fn resolve_search_paths(root: &Path, entries: &[String]) -> Vec<PathBuf> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() || entry == "." {
                root.to_path_buf()
            } else {
                let p = Path::new(entry);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    root.join(p)
                }
            }
        })
        .collect()
}

/// 按顺序用平台分隔符拼接
pub fn join_search_path(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(&PATH_DELIMITER.to_string())
}

/// 用户级配置文件：<config_dir>/preflight/config.toml
pub fn user_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| LaunchError::Config("无法找到用户配置目录".to_string()))?;
    Ok(dir.join("preflight").join("config.toml"))
}

/// 在给定的 PATH 值中查找可执行文件
pub fn find_in_path(program: &str, path_value: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return file_exists(candidate).then(|| candidate.to_path_buf());
    }

    let exts: &[&str] = if cfg!(windows) { &["", ".exe", ".bat", ".cmd"] } else { &[""] };
    for dir in path_value.split(PATH_DELIMITER).filter(|d| !d.is_empty()) {
        for ext in exts {
            let full = Path::new(dir).join(format!("{}{}", program, ext));
            if file_exists(&full) {
                return Some(full);
            }
        }
    }
    None
}

/// 检查文件是否存在
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// 读取文件内容，返回错误时提供详细信息
pub fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(LaunchError::FileNotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|e| {
        LaunchError::Io(std::io::Error::new(
            e.kind(),
            format!("读取文件 {} 失败: {}", path.display(), e),
        ))
    })
}

/// 安全写入文件 (使用临时文件 + 原子替换)
pub fn write_file_safe(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    Ok(())
}
