//! Module for the single ISBN lookup.

use super::*;

/// Arguments that can be used for the [`Commands::Lookup`]
#[derive(Args, Clone)]
pub struct LookupArgs {
  /// The ISBN to look up, hyphens allowed
  /// Example: "978-0-14-312774-1"
  pub identifier: String,

  /// Print the record as JSON
  #[arg(long)]
  pub json: bool,
}

/// Function for the [`Commands::Lookup`] in the CLI.
pub async fn lookup<I: UserInteraction>(
  interaction: &I,
  cli: &Cli,
  args: LookupArgs,
) -> Result<()> {
  let LookupArgs { identifier, json } = args;
  let fetcher = Fetcher::from_config(&cli.load_config()?)?;

  if !json {
    interaction.reply(ResponseContent::Working(&format!("Looking up {identifier}")))?;
  }
  let record = fetcher.fetch(&identifier).await;
  trace!("Lookup result: {record:?}");

  if json {
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
  } else {
    interaction.reply(ResponseContent::Record(&record))
  }
}
