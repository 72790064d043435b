// SPDX-License-Identifier: Apache-2.0

use netstate::NetworkPolicy;

use crate::{
    CliError,
    plan::get_arg,
    state::{new_json_arg, print_state, read_file, state_from_file},
};

pub(crate) struct CommandPolicy;

impl CommandPolicy {
    pub(crate) const CMD: &str = "policy";

    pub(crate) fn new_cmd() -> clap::Command {
        clap::Command::new("policy")
            .about("Expand network policy into desired state")
            .arg(
                clap::Arg::new("POLICY")
                    .required(true)
                    .index(1)
                    .help("Network policy file, `-` for stdin"),
            )
            .arg(
                clap::Arg::new("CURRENT_STATE")
                    .long("current")
                    .short('c')
                    .required(true)
                    .help("Current network state file to capture from"),
            )
            .arg(new_json_arg())
    }

    pub(crate) fn handle(matches: &clap::ArgMatches) -> Result<(), CliError> {
        let policy_content = read_file(get_arg(matches, "POLICY")?)?;
        let policy = NetworkPolicy::new_from_yaml(&policy_content)?;
        let current = state_from_file(get_arg(matches, "CURRENT_STATE")?)?;

        let state = policy.policy_to_state(&current)?;
        print_state(&state, matches)
    }
}
