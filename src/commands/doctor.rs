//! doctor 命令处理器

use super::{CommandContext, CommandHandler};
use crate::error::Result;
use crate::exit_codes;
use crate::utils::env_merge::LaunchEnv;
use crate::utils::paths;

/// doctor 命令：只读诊断，不启动任何子进程
pub struct DoctorCommand;

impl DoctorCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DoctorCommand {
    fn default() -> Self {
        Self::new()
    }
}

fn mark(exists: bool) -> &'static str {
    if exists { "✓" } else { "○" }
}

impl CommandHandler for DoctorCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let config = &ctx.config;
        let root = &ctx.project_root;

        println!("🔍 启动环境诊断\n");
        println!("版本: v{} | 平台: {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS);
        println!("──────────────────────────────────────────────\n");

        let mut warnings = 0;

        println!("📁 1. 项目目录");
        println!("   {} 根目录: {}", mark(root.is_dir()), root.display());
        for sub in ["src", "src/workflow", "src/image", "utils"] {
            let exists = root.join(sub).is_dir();
            println!("   {} {}", mark(exists), sub);
            if !exists {
                warnings += 1;
            }
        }
        println!();

        println!("⚙️  2. 配置");
        println!("   来源: {}", ctx.config_source);
        println!("   失败策略: {}", config.preflight.policy);
        println!();

        println!("🧭 3. 搜索路径 ({})", config.environment.search_path_var);
        for dir in paths::resolve_search_paths(root, &config.environment.search_paths) {
            println!("   {} {}", mark(dir.is_dir()), dir.display());
        }
        println!();

        println!("🐍 4. 虚拟环境与解释器");
        let script = root.join(&config.activation.script);
        let has_venv = paths::file_exists(&script);
        if !config.activation.enabled {
            println!("   ○ 激活已禁用");
        } else if has_venv {
            println!("   ✓ 激活脚本: {}", script.display());
        } else {
            println!("   ○ 无激活脚本: {} (将使用系统环境)", script.display());
        }
        let path_value = LaunchEnv::from_process()
            .get("PATH")
            .unwrap_or_default()
            .to_string();
        report_program(
            "解释器",
            &config.preflight.interpreter,
            &path_value,
            has_venv,
            &mut warnings,
        );
        println!();

        println!("📄 5. .env 文件");
        match &config.environment.dotenv {
            Some(dotenv) => {
                let path = root.join(dotenv);
                println!("   {} {}", mark(paths::file_exists(&path)), path.display());
            }
            None => println!("   ○ 未配置"),
        }
        println!();

        println!("🚀 6. 服务");
        report_program(
            "服务命令",
            &config.server.program,
            &path_value,
            has_venv,
            &mut warnings,
        );
        if let Some(script) = config.server.args.iter().find(|a| a.ends_with(".py")) {
            let exists = paths::file_exists(&root.join(script));
            println!("   {} 应用脚本: {}", mark(exists), script);
            if !exists {
                warnings += 1;
            }
        }
        println!("   命令行: {}", config.server.command_line().join(" "));
        println!();

        println!("──────────────────────────────────────────────");
        if warnings == 0 {
            println!("✅ 未发现明显问题");
        } else {
            println!("⚠️  发现 {} 个警告", warnings);
            if !ctx.verbose {
                println!("提示：使用 preflight check 验证模块导入");
            }
        }

        Ok(exit_codes::OK)
    }
}

/// 报告程序能否在 PATH 中找到；存在虚拟环境时程序可能由激活提供，不计警告
fn report_program(
    label: &str,
    program: &str,
    path_value: &str,
    has_venv: bool,
    warnings: &mut usize,
) {
    match paths::find_in_path(program, path_value) {
        Some(found) => println!("   ✓ {}: {}", label, found.display()),
        None if has_venv => println!("   ○ {}: {} (预计由虚拟环境提供)", label, program),
        None => {
            println!("   ⚠️  {}: 在 PATH 中找不到 {}", label, program);
            *warnings += 1;
        }
    }
}
