// SPDX-License-Identifier: Apache-2.0

use netstate::{MergedNetworkState, NetstateApplyOption};

use crate::{
    CliError,
    state::{new_json_arg, print_state, state_from_file},
};

pub(crate) struct CommandPlan;

impl CommandPlan {
    pub(crate) const CMD: &str = "plan";

    pub(crate) fn new_cmd() -> clap::Command {
        clap::Command::new("plan")
            .alias("p")
            .about("Generate the edit plan from desired and current state")
            .arg(
                clap::Arg::new("DESIRED_STATE")
                    .required(true)
                    .index(1)
                    .help("Desired network state file, `-` for stdin"),
            )
            .arg(
                clap::Arg::new("CURRENT_STATE")
                    .long("current")
                    .short('c')
                    .required(true)
                    .help("Current network state file"),
            )
            .arg(
                clap::Arg::new("MEMORY_ONLY")
                    .long("memory-only")
                    .action(clap::ArgAction::SetTrue)
                    .help("Do not make the state persistent"),
            )
            .arg(
                clap::Arg::new("KERNEL_ONLY")
                    .long("kernel-only")
                    .action(clap::ArgAction::SetTrue)
                    .help("Ignore user space interfaces and OVS database"),
            )
            .arg(
                clap::Arg::new("GEN_CONF_MODE")
                    .long("gen-conf-mode")
                    .action(clap::ArgAction::SetTrue)
                    .help("Allow unknown interfaces, ports and parents"),
            )
            .arg(new_json_arg())
    }

    pub(crate) fn handle(matches: &clap::ArgMatches) -> Result<(), CliError> {
        let desired = state_from_file(get_arg(matches, "DESIRED_STATE")?)?;
        let current = state_from_file(get_arg(matches, "CURRENT_STATE")?)?;

        let mut option = NetstateApplyOption::new();
        if matches.get_flag("MEMORY_ONLY") {
            option = option.memory_only();
        }
        if matches.get_flag("KERNEL_ONLY") {
            option = option.kernel_only();
        }
        if matches.get_flag("GEN_CONF_MODE") {
            option = option.gen_conf_mode();
        }

        let merged_state = MergedNetworkState::new(desired, current, option)?;
        if !merged_state.is_changed() {
            log::info!("Nothing changed");
        }
        let mut plan = merged_state.gen_state_for_apply();
        plan.hide_secrets();
        print_state(&plan, matches)
    }
}

pub(crate) fn get_arg<'a>(
    matches: &'a clap::ArgMatches,
    name: &str,
) -> Result<&'a str, CliError> {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| CliError::from(format!("{name} is required").as_str()))
}
