//! Module for setting up a bibfill configuration

use super::*;

/// Arguments that can be used for the [`Commands::Init`]
#[derive(Args, Clone)]
pub struct InitArgs {
  /// Directory for the provider definitions. Defaults to `providers/` next to
  /// the configuration file.
  #[arg(long)]
  pub providers_path: Option<PathBuf>,
}

/// Function for the [`Commands::Init`] in the CLI.
pub fn init<I: UserInteraction>(interaction: &I, cli: &Cli, args: InitArgs) -> Result<()> {
  let config_path = cli.config_path();

  if config_path.exists()
    && !interaction.confirm(&format!(
      "Configuration already exists at {}, do you want to overwrite it?",
      config_path.display()
    ))?
  {
    interaction.reply(ResponseContent::Info(
      "Keeping the existing configuration. Pass --config to write one elsewhere.",
    ))?;
    return Ok(());
  }

  let providers_path = args.providers_path.unwrap_or_else(|| default_providers_path(&config_path));
  let config = Config::default().with_providers_path(&providers_path);
  config.save(&config_path)?;
  let written = Config::write_default_providers(&providers_path)?;
  debug!("Wrote provider definitions: {written:?}");

  interaction.reply(ResponseContent::Success(&format!(
    "Configuration initialized successfully\nConfig path: {}\nProviders path: {}\nProvider \
     order: {}",
    config_path.display(),
    providers_path.display(),
    config.providers.join(" → "),
  )))?;
  Ok(())
}

/// Provider definitions live next to the configuration file.
fn default_providers_path(config_path: &Path) -> PathBuf {
  match config_path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.join("providers"),
    _ => Config::default_providers_path(),
  }
}
