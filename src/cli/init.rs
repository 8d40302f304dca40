//! `jobline init` - Write the built-in cargo CI descriptor

use anyhow::{Context, Result};
use jobline::job::{Descriptor, templates};
use std::fs;
use std::path::Path;

/// Renders the cargo CI job, optionally on another image
pub fn render(image: Option<&str>) -> Result<String> {
    let job = match image {
        Some(image) => templates::cargo_ci_with_image(image),
        None => templates::cargo_ci(),
    };
    Ok(Descriptor::to_yaml(&job)?)
}

/// Writes the descriptor, refusing to overwrite unless `force` is set
pub fn write_descriptor(output: &Path, image: Option<&str>, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let yaml = render(image)?;
    fs::write(output, yaml)
        .with_context(|| format!("Failed to write descriptor to: {}", output.display()))?;
    Ok(())
}
