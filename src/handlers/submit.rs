//! One-shot run or save of local sources.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::api::{Outcome, PlotClient, SaveReply};
use crate::printer::TextPrinter;
use crate::session::SubmitKind;

/// Submit the script and files once. Returns whether the service succeeded.
pub async fn run(
    client: &PlotClient,
    printer: &TextPrinter,
    kind: SubmitKind,
    script: Option<&Path>,
    files: &[String],
    out: Option<&Path>,
) -> Result<bool> {
    let script = script.ok_or_else(|| anyhow!("--{} needs a SCRIPT to submit", kind))?;
    let mut session = super::local_session(client.base_url(), Some(script), files)?;
    if session.code().trim().is_empty() {
        bail!("Cannot execute empty code");
    }

    match kind {
        SubmitKind::Run => {
            let sub = session.run();
            let outcome = client.run(&sub.payload).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "run request failed");
                Outcome::transport_failure(&e)
            });
            session.complete_run(sub.generation, outcome);
        }
        SubmitKind::Save => {
            let sub = session.save();
            let reply = client.save(&sub.payload).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "save request failed");
                SaveReply::failed(&e)
            });
            session.complete_save(sub.generation, reply);
        }
    }

    if let Some(outcome) = session.result() {
        printer.print_outcome(outcome);
    }
    if let Some(path) = out {
        if session.svg().is_empty() {
            eprintln!("Warning: no image returned, {} not written", path.display());
        } else {
            fs::write(path, session.svg())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
    }
    if kind == SubmitKind::Save {
        printer.print_share(&session);
    }
    Ok(session.error().is_none())
}
