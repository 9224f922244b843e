//! Entry points for each command-line mode.

pub mod edit;
pub mod image;
pub mod replot;
pub mod show;
pub mod submit;

use std::path::Path;

use anyhow::{anyhow, Result};

use crate::session::{links, Session};
use crate::utils;

/// Build a session from a local script and `--file` arguments.
pub(crate) fn local_session(base_url: &str, script: Option<&Path>, files: &[String]) -> Result<Session> {
    let code = match script {
        Some(path) => utils::read_source(path)?,
        None => String::new(),
    };
    let files = utils::load_files(files)?;
    let session = Session::with_sources(base_url, code, files);
    warn_invalid_names(&session);
    Ok(session)
}

pub(crate) fn warn_invalid_names(session: &Session) {
    for file in session.files().iter().filter(|f| !f.has_valid_name()) {
        eprintln!(
            "Warning: file name '{}' may only contain [0-9a-zA-Z_]; the server will reject it.",
            file.name
        );
    }
}

/// Resolve an `ID|URL` argument to a plot id.
pub(crate) fn plot_id(arg: &str) -> Result<String> {
    links::parse_plot_id(arg.trim()).ok_or_else(|| anyhow!("'{}' is neither a plot id nor an /edit/<id> URL", arg))
}
