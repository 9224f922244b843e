//! Download the rendered image of a saved plot.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::api::{ImageRequest, PlotClient};

pub async fn run(client: &PlotClient, target: &str, req: ImageRequest, out: &Path) -> Result<bool> {
    let id = super::plot_id(target)?;
    let bytes = match client.image(&id, req).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(false);
        }
    };
    fs::write(out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {} ({} bytes)", out.display(), bytes.len());
    Ok(true)
}
