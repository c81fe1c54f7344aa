//! launch 命令处理器

use super::{CommandContext, CommandHandler, with_process_hooks};
use crate::cli::LaunchArgs;
use crate::error::Result;
use crate::preflight::report::ConsoleReporter;
use tracing::info;

/// launch 命令：预检通过后启动服务，退出码透传
pub struct LaunchCommand {
    args: LaunchArgs,
    port: Option<u16>,
}

impl LaunchCommand {
    pub fn new(args: LaunchArgs, port: Option<u16>) -> Self {
        Self { args, port }
    }
}

impl CommandHandler for LaunchCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let mut config = ctx.config.clone();
        self.args.apply(&mut config)?;
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config.validate()?;

        let sequencer = ctx.sequencer(&config, &self.args.env)?;
        let reporter = ConsoleReporter::new(false);
        let code = with_process_hooks(&config, &reporter, |hooks| sequencer.run(hooks))?;

        info!(code, "launcher finished");
        Ok(code)
    }
}
