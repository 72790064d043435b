// SPDX-License-Identifier: Apache-2.0

use std::io::Read;

use netstate::NetworkState;
use serde::Serialize;

use super::CliError;

/// Read file content, `-` means stdin.
pub(crate) fn read_file(file_path: &str) -> Result<String, CliError> {
    let mut content = String::new();
    if file_path == "-" {
        std::io::stdin().read_to_string(&mut content)?;
    } else {
        std::fs::File::open(file_path)?.read_to_string(&mut content)?;
    }
    // Replace non-breaking space '\u{A0}' to normal space
    Ok(content.replace('\u{A0}', " "))
}

pub(crate) fn state_from_file(
    file_path: &str,
) -> Result<NetworkState, CliError> {
    let content = read_file(file_path)?;
    if content.trim_start().starts_with('{') {
        Ok(NetworkState::new_from_json(&content)?)
    } else {
        Ok(NetworkState::new_from_yaml(&content)?)
    }
}

pub(crate) fn print_state<T>(
    state: &T,
    matches: &clap::ArgMatches,
) -> Result<(), CliError>
where
    T: Serialize,
{
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        print!("{}", serde_yaml::to_string(state)?);
    }
    Ok(())
}

pub(crate) fn new_json_arg() -> clap::Arg {
    clap::Arg::new("json")
        .long("json")
        .action(clap::ArgAction::SetTrue)
        .help("Print in JSON format instead of YAML")
}
