//! Module for enriching a whole list of ISBNs.

use super::*;

/// Arguments that can be used for the [`Commands::Batch`]
#[derive(Args, Clone)]
pub struct BatchArgs {
  /// Table with one ISBN per row in its first column, no header
  pub file: PathBuf,

  /// Directory the result tables are written to
  #[arg(long, short, default_value = ".")]
  pub output_dir: PathBuf,
}

/// Function for the [`Commands::Batch`] in the CLI.
pub async fn batch<I: UserInteraction>(interaction: &I, cli: &Cli, args: BatchArgs) -> Result<()> {
  let BatchArgs { file, output_dir } = args;
  if !file.exists() {
    return Err(BibfilldError::MissingInput(file));
  }

  let coordinator = Coordinator::from_config(&cli.load_config()?)?;
  let identifiers = table::read_identifiers(&file)?;
  if identifiers.is_empty() {
    interaction.reply(ResponseContent::Warning(&format!(
      "No ISBNs found in {}",
      file.display()
    )))?;
  } else {
    interaction.reply(ResponseContent::Working(&format!(
      "Looking up {} ISBNs with up to {} in flight",
      identifiers.len(),
      coordinator.concurrency()
    )))?;
  }

  let mut progress_error = None;
  let report = coordinator
    .lookup_many_with_progress(identifiers, |progress| {
      if let Err(e) = interaction.progress(progress) {
        progress_error.get_or_insert(e);
      }
    })
    .await;
  if let Some(e) = progress_error {
    return Err(e);
  }

  let files = table::export(&report, &output_dir, chrono::Local::now().date_naive())?;
  interaction.reply(ResponseContent::Summary(&report, &files))
}
