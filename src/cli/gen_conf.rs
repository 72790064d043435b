// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, plan::get_arg, state::state_from_file};

pub(crate) struct CommandGenConf;

impl CommandGenConf {
    pub(crate) const CMD: &str = "gen-conf";

    pub(crate) fn new_cmd() -> clap::Command {
        clap::Command::new("gen-conf")
            .alias("g")
            .about("Generate NetworkManager keyfiles from desired state")
            .arg(
                clap::Arg::new("DESIRED_STATE")
                    .required(true)
                    .index(1)
                    .help("Desired network state file"),
            )
    }

    pub(crate) fn handle(matches: &clap::ArgMatches) -> Result<(), CliError> {
        let desired = state_from_file(get_arg(matches, "DESIRED_STATE")?)?;
        let keyfiles = desired.gen_conf()?;

        let output: Vec<(String, String)> = keyfiles
            .iter()
            .map(|k| (k.file_name(), k.to_string()))
            .collect();
        print!("{}", serde_yaml::to_string(&output)?);
        Ok(())
    }
}
