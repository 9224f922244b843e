//! Re-run a saved plot with replacement files.

use anyhow::{bail, Result};

use crate::api::{PlotClient, SaveReply};
use crate::printer::TextPrinter;
use crate::session::{files::file_map, links};

pub async fn run(client: &PlotClient, printer: &TextPrinter, target: &str, files: &[String]) -> Result<bool> {
    let id = super::plot_id(target)?;
    let session = super::local_session(client.base_url(), None, files)?;
    if session.files().is_empty() {
        bail!("--replot needs at least one --file to replace");
    }

    let reply = client
        .replot(&id, &file_map(session.files()))
        .await
        .unwrap_or_else(|e| SaveReply::failed(&e));
    printer.print_outcome(&reply.outcome);
    if reply.outcome.is_failure() {
        return Ok(false);
    }

    if !reply.id.is_empty() {
        println!("edit: {}", links::edit_url(client.base_url(), &reply.id));
        println!("image: {}", links::image_url(client.base_url(), &reply.id));
    }
    Ok(true)
}
