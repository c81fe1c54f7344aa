//! check 命令处理器

use super::{CommandContext, CommandHandler, with_process_hooks};
use crate::cli::LaunchArgs;
use crate::error::Result;
use crate::exit_codes;
use crate::preflight::Reporter;
use crate::preflight::report::{self, ConsoleReporter};
use crate::types::OutputFormat;

/// check 命令：只执行环境配置、激活和模块检查
pub struct CheckCommand {
    args: LaunchArgs,
    format: OutputFormat,
}

impl CheckCommand {
    pub fn new(args: LaunchArgs, format: &str) -> Self {
        Self {
            args,
            format: OutputFormat::from(format),
        }
    }
}

impl CommandHandler for CheckCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let mut config = ctx.config.clone();
        self.args.apply(&mut config)?;

        let sequencer = ctx.sequencer(&config, &self.args.env)?;
        let json = self.format == OutputFormat::JSON;
        // JSON 模式下 stdout 只输出报告
        let reporter = ConsoleReporter::new(json);
        let (_, result) = with_process_hooks(&config, &reporter, |hooks| sequencer.preflight(hooks))?;

        if json {
            println!("{}", report::render_json(&result)?);
        } else {
            let (severity, line) = report::summary(&result);
            reporter.line(severity, &line);
        }

        Ok(if result.is_healthy() {
            exit_codes::OK
        } else {
            exit_codes::PREFLIGHT_FAILED
        })
    }
}
