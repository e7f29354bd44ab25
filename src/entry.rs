use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{Cli, Command};
use crate::config::{apply_dashboard_config, apply_load_config, load_config};
use crate::dashboard::run_dashboard;
use crate::error::{AppError, AppResult, ValidationError};
use crate::load::run_load_test;

pub(crate) fn run() -> AppResult<()> {
    let matches = Cli::command().get_matches();
    let mut cli = Cli::from_arg_matches(&matches)?;
    apply_config(&mut cli, &matches)?;

    crate::logger::init_logging(cli.verbose, cli.no_color);

    let runtime = match &cli.command {
        Command::Dashboard(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build(),
        Command::Load(_) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build(),
    }
    .map_err(|err| AppError::validation(ValidationError::RuntimeBuildFailed { source: err }))?;

    runtime.block_on(run_command(cli.command))
}

async fn run_command(command: Command) -> AppResult<()> {
    match command {
        Command::Dashboard(args) => run_dashboard(&args).await,
        Command::Load(args) => run_load_test(&args).await,
    }
}

fn apply_config(cli: &mut Cli, matches: &ArgMatches) -> AppResult<()> {
    let Some(config) = load_config(cli.config.as_deref())? else {
        return Ok(());
    };
    match (&mut cli.command, matches.subcommand()) {
        (Command::Dashboard(args), Some(("dashboard", sub_matches))) => {
            if let Some(section) = config.dashboard.as_ref() {
                apply_dashboard_config(args, sub_matches, section)?;
            }
        }
        (Command::Load(args), Some(("load", sub_matches))) => {
            if let Some(section) = config.load.as_ref() {
                apply_load_config(args, sub_matches, section)?;
            }
        }
        (Command::Dashboard(_) | Command::Load(_), _) => {}
    }
    Ok(())
}
