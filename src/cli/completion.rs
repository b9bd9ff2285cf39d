//! Shell completion generation for ruwc
//!
//! Generates completion scripts for Bash, Zsh, Fish, PowerShell and Elvish,
//! either to a writer or installed into the shell's usual directory.

use crate::error::{Result, RuwcError};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate completion script for the specified shell
pub fn generate_completion<W: Write>(shell: Shell, writer: &mut W, bin_name: &str) -> Result<()> {
    let mut cmd = crate::cli::Cli::command();
    generate(shell, &mut cmd, bin_name, writer);
    Ok(())
}

/// Generate completion script to a file
pub fn generate_completion_to_file<P: AsRef<Path>>(shell: Shell, output_path: P, bin_name: &str) -> Result<()> {
    let mut file = std::fs::File::create(&output_path).map_err(|e| {
        RuwcError::io_error(
            format!("Failed to create completion file: {}", output_path.as_ref().display()),
            e,
        )
    })?;

    generate_completion(shell, &mut file, bin_name)?;

    tracing::info!(
        "Generated {} completion script: {}",
        shell_name(shell),
        output_path.as_ref().display()
    );

    Ok(())
}

/// Get the default installation path for completion scripts
pub fn get_default_completion_path(shell: Shell, bin_name: &str) -> Option<PathBuf> {
    use dirs::config_dir;

    match shell {
        Shell::Bash => {
            if let Ok(completion_dir) = std::env::var("BASH_COMPLETION_USER_DIR") {
                return Some(PathBuf::from(completion_dir).join(bin_name));
            }
            dirs::data_local_dir().map(|dir| dir.join("bash-completion").join("completions").join(bin_name))
        }
        Shell::Zsh => {
            config_dir().map(|dir| dir.join("zsh").join("completions").join(format!("_{}", bin_name)))
        }
        Shell::Fish => {
            config_dir().map(|dir| dir.join("fish").join("completions").join(format!("{}.fish", bin_name)))
        }
        Shell::PowerShell => {
            config_dir().map(|dir| dir.join("powershell").join(format!("{}.ps1", bin_name)))
        }
        Shell::Elvish => {
            config_dir().map(|dir| dir.join("elvish").join("lib").join(format!("{}.elv", bin_name)))
        }
        _ => None,
    }
}

/// Get human-readable shell name
pub fn shell_name(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash => "Bash",
        Shell::Zsh => "Zsh",
        Shell::Fish => "Fish",
        Shell::PowerShell => "PowerShell",
        Shell::Elvish => "Elvish",
        _ => "Unknown",
    }
}

/// Install completion script to the default location
pub fn install_completion(shell: Shell, bin_name: &str) -> Result<()> {
    let default_path = get_default_completion_path(shell, bin_name)
        .ok_or_else(|| RuwcError::config_error("Could not determine default completion path", None))?;

    if let Some(parent) = default_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RuwcError::io_error(
                format!("Failed to create completion directory: {}", parent.display()),
                e,
            )
        })?;
    }

    generate_completion_to_file(shell, &default_path, bin_name)?;

    eprintln!(
        "Installed {} completion script to: {}",
        shell_name(shell),
        default_path.display()
    );
    print_installation_instructions(shell, &default_path);

    Ok(())
}

/// Print shell-specific installation instructions
fn print_installation_instructions(shell: Shell, path: &Path) {
    match shell {
        Shell::Bash => {
            eprintln!("\nbash-completion loads this directory automatically; otherwise add to ~/.bashrc:");
            eprintln!("    source {}", path.display());
        }
        Shell::Zsh => {
            eprintln!("\nAdd the completion directory to your fpath in ~/.zshrc:");
            if let Some(parent) = path.parent() {
                eprintln!("    fpath=(\"{}\" $fpath)", parent.display());
            }
            eprintln!("    autoload -U compinit && compinit");
        }
        Shell::Fish => {
            eprintln!("\nFish loads completions from this directory automatically.");
        }
        Shell::PowerShell => {
            eprintln!("\nAdd the following to your PowerShell profile:");
            eprintln!("    . {}", path.display());
        }
        Shell::Elvish => {
            eprintln!("\nAdd the following to your ~/.elvish/rc.elv:");
            eprintln!("    use {}", path.display());
        }
        _ => {
            eprintln!("\nCompletion script generated at: {}", path.display());
        }
    }
}
