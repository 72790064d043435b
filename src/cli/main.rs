// SPDX-License-Identifier: Apache-2.0

mod error;
mod gen_conf;
mod plan;
mod policy;
mod state;
mod verify;

pub(crate) use self::error::CliError;
use self::{
    gen_conf::CommandGenConf, plan::CommandPlan, policy::CommandPolicy,
    verify::CommandVerify,
};

fn main() {
    let mut cli_cmd = clap::Command::new("netstatectl")
        .about("Declarative network state planning tool")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            clap::Arg::new("quiet")
                .short('q')
                .action(clap::ArgAction::SetTrue)
                .help("Only log errors")
                .global(true),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .action(clap::ArgAction::Count)
                .help("Increase verbose level")
                .global(true),
        )
        .subcommand(CommandPlan::new_cmd())
        .subcommand(CommandVerify::new_cmd())
        .subcommand(CommandGenConf::new_cmd())
        .subcommand(CommandPolicy::new_cmd());

    let matches = cli_cmd.get_matches_mut();

    let log_level = if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        match matches.get_count("verbose") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    let mut log_builder = env_logger::Builder::new();
    for log_group in ["netstate", "netstatectl"] {
        log_builder.filter(Some(log_group), log_level);
    }
    log_builder.init();

    log::debug!("netstatectl version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = call_subcommand(&matches) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn call_subcommand(matches: &clap::ArgMatches) -> Result<(), CliError> {
    if let Some(matches) = matches.subcommand_matches(CommandPlan::CMD) {
        CommandPlan::handle(matches)
    } else if let Some(matches) = matches.subcommand_matches(CommandVerify::CMD)
    {
        CommandVerify::handle(matches)
    } else if let Some(matches) =
        matches.subcommand_matches(CommandGenConf::CMD)
    {
        CommandGenConf::handle(matches)
    } else if let Some(matches) = matches.subcommand_matches(CommandPolicy::CMD)
    {
        CommandPolicy::handle(matches)
    } else {
        Err(CliError::from("Unknown command"))
    }
}
