//! Interactive editor mode.

use std::io;
use std::path::Path;

use anyhow::{anyhow, Result};
use is_terminal::IsTerminal;

use crate::api::PlotClient;
use crate::config::Config;
use crate::session::Session;
use crate::tui::run_tui_editor;

/// Open the editor on local sources, or on a saved plot when `open` is given.
pub async fn run(
    cfg: &Config,
    client: PlotClient,
    script: Option<&Path>,
    files: &[String],
    open: Option<&str>,
) -> Result<()> {
    if !io::stdout().is_terminal() {
        eprintln!("Warning: the editor needs a terminal. Use --run or --save for non-interactive use.");
        return Err(anyhow!("the editor requires a proper terminal environment"));
    }

    let (session, open_id) = match open {
        Some(target) => (Session::new(client.base_url()), Some(super::plot_id(target)?)),
        None => (super::local_session(client.base_url(), script, files)?, None),
    };
    run_tui_editor(cfg, client, session, open_id).await
}
