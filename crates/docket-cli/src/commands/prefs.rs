//! Prefs command - inspect and change the one-time hint flags.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use docket_core::preferences::{FilePreferences, PreferenceFlag, PreferenceStore};

use super::{config_dir, load_config};

/// Arguments for the prefs command.
#[derive(Args)]
pub struct PrefsArgs {
    #[command(subcommand)]
    command: PrefsCommand,
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Show every flag
    Show,

    /// Set a flag
    Set {
        /// Flag name, e.g. onboardingShown
        flag: PreferenceFlag,
        /// New value
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Print whether the hint should be shown, then mark it as shown
    Take {
        /// Flag name
        flag: PreferenceFlag,
    },

    /// Clear every flag
    Reset,
}

pub async fn run(args: PrefsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let path = resolve_path(config.preferences.path);
    let mut prefs = FilePreferences::open(&path)?;

    match args.command {
        PrefsCommand::Show => {
            println!("Preferences file: {}", prefs.path().display());
            for flag in PreferenceFlag::ALL {
                let value = prefs.get(flag);
                let marker = if value {
                    style("✓").green()
                } else {
                    style("·").dim()
                };
                println!("{} {:<24} {}", marker, flag.name(), value);
            }
        }
        PrefsCommand::Set { flag, value } => {
            prefs.set(flag, value)?;
            println!("{} Set {} = {}", style("✓").green(), flag, value);
        }
        PrefsCommand::Take { flag } => {
            println!("{}", prefs.take_once(flag)?);
        }
        PrefsCommand::Reset => {
            prefs.reset()?;
            println!("{} Cleared all flags", style("✓").green());
        }
    }

    Ok(())
}

/// Relative paths live next to the configuration file.
fn resolve_path(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        config_dir().join(path)
    }
}
