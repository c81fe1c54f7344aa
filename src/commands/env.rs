//! env 命令处理器

use super::{CommandContext, CommandHandler, with_process_hooks};
use crate::cli::LaunchArgs;
use crate::error::Result;
use crate::exit_codes;
use crate::preflight::report::ConsoleReporter;
use crate::types::OutputFormat;
use std::collections::BTreeMap;

/// env 命令：打印交给子进程的环境（默认只显示变化的部分）
pub struct EnvCommand {
    args: LaunchArgs,
    format: OutputFormat,
    all: bool,
}

impl EnvCommand {
    pub fn new(args: LaunchArgs, format: &str, all: bool) -> Self {
        Self {
            args,
            format: OutputFormat::from(format),
            all,
        }
    }
}

impl CommandHandler for EnvCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let mut config = ctx.config.clone();
        self.args.apply(&mut config)?;

        let sequencer = ctx.sequencer(&config, &self.args.env)?;
        let reporter = ConsoleReporter::new(true);
        let env = with_process_hooks(&config, &reporter, |hooks| sequencer.prepare(hooks))?;

        let vars: BTreeMap<&String, &String> = if self.all {
            env.vars().collect()
        } else {
            env.changed().into_iter().collect()
        };
        let removed = env.removed();

        match self.format {
            OutputFormat::JSON => {
                let json = serde_json::json!({
                    "set": vars,
                    "removed": removed,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            _ => {
                for (key, value) in &vars {
                    println!("{}={}", key, value);
                }
                for key in &removed {
                    println!("# unset {}", key);
                }
            }
        }

        Ok(exit_codes::OK)
    }
}
