//! Module for inspecting the provider chain.

use super::*;

/// Function for the [`Commands::Providers`] in the CLI.
pub fn providers<I: UserInteraction>(interaction: &I, cli: &Cli) -> Result<()> {
  let config = cli.load_config()?;
  let providers = config.provider_configs()?;
  interaction.reply(ResponseContent::Providers(&providers))
}
