//! Print a saved plot without running it.

use anyhow::Result;

use crate::api::{PlotClient, PlotRecord};
use crate::printer::TextPrinter;
use crate::session::Session;

pub async fn run(client: &PlotClient, printer: &TextPrinter, target: &str) -> Result<bool> {
    let id = super::plot_id(target)?;
    let record = client.fetch_plot(&id).await.unwrap_or_else(|e| PlotRecord::failed(&e));

    let mut session = Session::new(client.base_url());
    // print only; the follow-up run is not sent
    let _ = session.hydrate(&id, record);
    if let Some(error) = session.error() {
        eprintln!("error: {}", error);
        return Ok(false);
    }
    printer.print_sources(&session);
    println!();
    printer.print_share(&session);
    Ok(true)
}
