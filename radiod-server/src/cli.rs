// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::path::PathBuf;

use clap::Parser;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - multichannel SDR receiver daemon");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
pub struct Cli {
    /// Config file or directory (tries `<path>.d/` if `<path>` doesn't exist)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Increase logging verbosity; repeatable (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Override the front-end driver named in the config file
    #[arg(short = 'd', long = "driver")]
    pub driver: Option<String>,

    /// Print the resolved configuration and exit without starting the engine
    #[arg(long = "dump-config")]
    pub dump_config: bool,

    /// Run without joining any multicast status/command group (offline test mode)
    #[arg(long = "no-status")]
    pub no_status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_config_path_and_repeated_verbosity() {
        let cli = Cli::parse_from(["radiod", "-vvv", "/etc/radiod.conf"]);
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.config, PathBuf::from("/etc/radiod.conf"));
    }
}
