//! Configuration management commands.

use clap::{Args, Subcommand};

use codec_bridge::BridgeConfig;

use super::{config_path, get_config, print_success};
use crate::Cli;

/// Manage configuration.
///
/// Configuration is stored in ~/.codec-bridge/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    #[command(alias = "view")]
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                print!("{}", cfg.to_yaml()?);
                Ok(())
            }
            ConfigSubcommand::Init { force } => {
                let path = config_path(cli)
                    .or_else(BridgeConfig::default_config_path)
                    .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?;
                if path.exists() && !force {
                    anyhow::bail!("{} already exists; use --force to overwrite", path.display());
                }
                let written = codec_bridge::save_config(&BridgeConfig::default(), Some(&path))?;
                print_success(&format!("Wrote {}", written.display()));
                Ok(())
            }
            ConfigSubcommand::Path => {
                match config_path(cli).or_else(BridgeConfig::default_config_path) {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No home directory"),
                }
                Ok(())
            }
        }
    }
}
