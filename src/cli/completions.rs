//! `jobline completions` - Generate shell completions
//!
//! Supports bash, zsh, fish, PowerShell and elvish.

use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs;
use std::path::Path;

/// Renders the completion script for `shell`
pub fn generate_completions(shell: Shell) -> Result<String> {
    use clap_complete::generate;

    let mut cmd = super::build_cli();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, "jobline", &mut buf);

    String::from_utf8(buf).context("Failed to generate completions")
}

/// Writes a completion script to `output_path`
pub fn save_completions(completions: &str, output_path: &Path) -> Result<()> {
    fs::write(output_path, completions)
        .with_context(|| format!("Failed to write completions to: {}", output_path.display()))?;
    Ok(())
}
