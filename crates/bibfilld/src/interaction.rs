//! Terminal output and prompts.
//!
//! Commands talk to the user only through [`UserInteraction`], which keeps them
//! independent of how replies are rendered.

use std::time::Duration;

use bibfill::record::Field;
use console::Term;
use dialoguer::Confirm;

use super::*;

pub static INFO_PREFIX: &str = "ℹ ";
pub static WORKING_PREFIX: &str = "» ";
pub static SUCCESS_PREFIX: &str = "✓ ";
pub static ERROR_PREFIX: &str = "✗ ";
pub static WARNING_PREFIX: &str = "! ";
pub static PROMPT_PREFIX: &str = "❯ ";
pub static ITEM_PREFIX: &str = "├─";
pub static LAST_ITEM_PREFIX: &str = "└─";

/// Something a command wants to show.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// A single looked up record
  Record(&'a Record),
  /// Counts and output files of a finished batch
  Summary(&'a Report, &'a ExportFiles),
  /// The configured provider chain
  Providers(&'a [ProviderConfig]),
  Success(&'a str),
  Working(&'a str),
  Warning(&'a str),
  Error(&'a BibfilldError),
  Info(&'a str),
}

pub trait UserInteraction {
  fn confirm(&self, message: &str) -> Result<bool>;
  fn reply(&self, content: ResponseContent) -> Result<()>;
  fn progress(&self, progress: Progress) -> Result<()>;
}

/// Interactive terminal on stdout.
pub struct Terminal {
  /// Answer every prompt with its default
  accept_defaults: bool,
  term:            Term,
}

impl Terminal {
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults, term: Term::stdout() } }

  /// Prints `items` as a tree under the previous line.
  fn tree(&self, items: &[(String, String)]) -> Result<()> {
    for (i, (label, value)) in items.iter().enumerate() {
      let prefix = if i + 1 == items.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
      self.term.write_line(&format!(
        "   {} {} {}",
        style(prefix).dim(),
        style(format!("{label}:")).green().bold(),
        value
      ))?;
    }
    Ok(())
  }
}

impl UserInteraction for Terminal {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{}", style(PROMPT_PREFIX).cyan(), message))
        .default(false)
        .interact()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Record(record) => {
        if record.is_not_found() {
          self.term.write_line(&format!(
            "{} No metadata found for {}",
            style(WARNING_PREFIX).yellow(),
            style(&record.isbn).yellow()
          ))?;
          if let Some(error) = &record.error {
            self.term.write_line(&format!("   {} {}", style("Error:").red().bold(), error))?;
          }
          return Ok(());
        }

        self.term.write_line(&format!(
          "{} Found {} via {}",
          style(SUCCESS_PREFIX).green(),
          style(&record.isbn).yellow(),
          style(&record.source).cyan()
        ))?;
        let items: Vec<(String, String)> = record
          .columns()
          .filter(|(field, _)| !matches!(field, Field::Isbn | Field::Source))
          .map(|(field, value)| (field.to_string(), value.to_string()))
          .collect();
        self.tree(&items)
      },

      ResponseContent::Summary(report, files) => {
        self.term.write_line(&format!("{} Process finished!", style(SUCCESS_PREFIX).green()))?;
        self.term.write_line(&format!(
          "{} Total processing time: {}",
          style(INFO_PREFIX).blue(),
          format_elapsed(report.elapsed)
        ))?;
        self.term.write_line(&format!(
          "   {} {}",
          style("Found ISBNs:").green().bold(),
          report.found_count()
        ))?;
        self.term.write_line(&format!(
          "   {} {}",
          style("Not Found ISBNs:").red().bold(),
          report.not_found.len()
        ))?;
        self.term.write_line(&format!(
          "   {} {}",
          style("Total ISBNs Processed:").bold(),
          report.total()
        ))?;

        let mut written = vec![("Found".to_string(), files.found.display().to_string())];
        if let Some(path) = &files.not_found {
          written.push(("Not found".to_string(), path.display().to_string()));
        }
        if let Some(path) = &files.errors {
          written.push(("Errors".to_string(), path.display().to_string()));
        }
        self.term.write_line(&format!("{} Wrote:", style(INFO_PREFIX).blue()))?;
        self.tree(&written)
      },

      ResponseContent::Providers(providers) => {
        if providers.is_empty() {
          return self.reply(ResponseContent::Warning("No providers configured"));
        }
        for (position, provider) in providers.iter().enumerate() {
          self.term.write_line(&format!(
            "{} {}",
            style(format!("{}.", position + 1)).dim(),
            style(&provider.name).cyan().bold()
          ))?;
          let key = match provider.resolve_api_key() {
            Some(key) => mask_key(&key),
            None if provider.requires_key => "missing (required)".to_string(),
            None => "none".to_string(),
          };
          self.tree(&[
            ("Endpoint".to_string(), provider.endpoint_template.clone()),
            ("Attempts".to_string(), provider.retry.max_attempts.max(1).to_string()),
            ("Timeout".to_string(), format!("{}s", provider.timeout_secs)),
            ("API key".to_string(), key),
            ("Fields".to_string(), provider.field_maps.len().to_string()),
          ])?;
        }
        Ok(())
      },

      ResponseContent::Success(message) =>
        Ok(self.term.write_line(&format!("{} {}", style(SUCCESS_PREFIX).green(), message))?),
      ResponseContent::Working(message) =>
        Ok(self.term.write_line(&format!("{} {}", style(WORKING_PREFIX).cyan(), message))?),
      ResponseContent::Warning(message) =>
        Ok(self.term.write_line(&format!("{} {}", style(WARNING_PREFIX).yellow(), message))?),
      ResponseContent::Info(message) =>
        Ok(self.term.write_line(&format!("{} {}", style(INFO_PREFIX).blue(), message))?),
      ResponseContent::Error(error) => Ok(Term::stderr()
        .write_line(&format!("{} {}", style(ERROR_PREFIX).red(), style(error).red()))?),
    }
  }

  fn progress(&self, progress: Progress) -> Result<()> {
    if self.term.is_term() {
      self.term.clear_line()?;
      self.term.write_str(&progress.to_string())?;
      if progress.completed == progress.total {
        self.term.write_line("")?;
      }
    } else if progress.completed == progress.total {
      self.term.write_line(&progress.to_string())?;
    }
    Ok(())
  }
}

/// Formats a duration as `X minute(s) and Y second(s)`, or `Y second(s)` under a minute.
pub fn format_elapsed(elapsed: Duration) -> String {
  let total = elapsed.as_secs();
  if total >= 60 {
    format!("{} minute(s) and {} second(s)", total / 60, total % 60)
  } else {
    format!("{total} second(s)")
  }
}
