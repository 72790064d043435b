// SPDX-License-Identifier: Apache-2.0

use netstate::MergedNetworkState;

use crate::{CliError, plan::get_arg, state::state_from_file};

pub(crate) struct CommandVerify;

impl CommandVerify {
    pub(crate) const CMD: &str = "verify";

    pub(crate) fn new_cmd() -> clap::Command {
        clap::Command::new("verify")
            .alias("v")
            .about("Verify current network state against desired state")
            .arg(
                clap::Arg::new("DESIRED_STATE")
                    .required(true)
                    .index(1)
                    .help("Desired network state file"),
            )
            .arg(
                clap::Arg::new("CURRENT_STATE")
                    .required(true)
                    .index(2)
                    .help("Current network state file"),
            )
    }

    pub(crate) fn handle(matches: &clap::ArgMatches) -> Result<(), CliError> {
        let desired = state_from_file(get_arg(matches, "DESIRED_STATE")?)?;
        let current = state_from_file(get_arg(matches, "CURRENT_STATE")?)?;

        let merged_state = MergedNetworkState::new(
            desired,
            current.clone(),
            Default::default(),
        )?;
        merged_state.verify(&current)?;
        log::info!("Current state matches desired state");
        Ok(())
    }
}
