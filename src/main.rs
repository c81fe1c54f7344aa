//! preflight 主程序入口
//!
//! 入口只负责解析参数、加载配置和分发命令；
//! 错误统一在这里报告并映射为退出码

use clap::Parser;
use preflight::cli::{Cli, Commands, ConfigCommands, LaunchArgs};
use preflight::commands::check::CheckCommand;
use preflight::commands::config::{ConfigInitCommand, ConfigShowCommand, ConfigValidateCommand};
use preflight::commands::doctor::DoctorCommand;
use preflight::commands::env::EnvCommand;
use preflight::commands::launch::LaunchCommand;
use preflight::commands::{CommandContext, CommandHandler};
use preflight::error::Result;
use preflight::utils::paths;
use preflight::{config, logging};
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(cli.command, cli.config, cli.project_root, cli.verbose) {
        Ok(code) => code,
        Err(e) => {
            e.report(cli.verbose);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

fn run(
    command: Option<Commands>,
    config_path: Option<std::path::PathBuf>,
    project_root: Option<std::path::PathBuf>,
    verbose: bool,
) -> Result<i32> {
    let project_root = paths::resolve_project_root(project_root.as_deref())?;

    // init 不读取现有配置，损坏的配置文件不能挡住重建
    if let Some(Commands::Config(ConfigCommands::Init { force })) = &command {
        return ConfigInitCommand::new(*force).run(&project_root, verbose);
    }

    let (config, config_source) = config::load(config_path.as_deref(), &project_root)?;
    debug!(source = %config_source, root = %project_root.display(), "config loaded");

    let ctx = CommandContext {
        verbose,
        project_root,
        config,
        config_source,
    };

    let handler: Box<dyn CommandHandler> = match command {
        None => Box::new(LaunchCommand::new(LaunchArgs::default(), None)),
        Some(Commands::Launch { args, port }) => Box::new(LaunchCommand::new(args, port)),
        Some(Commands::Check { args, format }) => Box::new(CheckCommand::new(args, &format)),
        Some(Commands::Env { args, format, all }) => Box::new(EnvCommand::new(args, &format, all)),
        Some(Commands::Doctor) => Box::new(DoctorCommand::new()),
        Some(Commands::Config(ConfigCommands::Init { force })) => {
            Box::new(ConfigInitCommand::new(force))
        }
        Some(Commands::Config(ConfigCommands::Show)) => Box::new(ConfigShowCommand),
        Some(Commands::Config(ConfigCommands::Validate)) => Box::new(ConfigValidateCommand),
    };

    handler.execute(&ctx)
}
