mod api;
mod cli;
mod config;
mod handlers;
mod logging;
mod printer;
mod session;
mod tui;
mod utils;

use anyhow::Result;
use config::Config;

use crate::api::{ImageRequest, PlotClient};
use crate::logging::LogTarget;
use crate::printer::TextPrinter;
use crate::session::SubmitKind;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Load config; --server overrides API_BASE_URL
    let mut cfg = Config::load();
    if let Some(server) = args.server.as_deref() {
        cfg.set("API_BASE_URL", server);
    }

    let interactive = !(args.run
        || args.save
        || args.show.is_some()
        || args.replot.is_some()
        || args.image.is_some());
    logging::init(&cfg, if interactive { LogTarget::File } else { LogTarget::Stderr })?;
    tracing::debug!(config = %cfg.config_path.display(), base_url = %cfg.api_base_url(), "configuration loaded");

    let client = PlotClient::from_config(&cfg)?;
    let printer = TextPrinter::new(cfg.get("DEFAULT_COLOR"));
    let script = args.script.as_deref();

    // Route to handler
    let succeeded = if args.run {
        handlers::submit::run(&client, &printer, SubmitKind::Run, script, &args.files, args.out.as_deref()).await?
    } else if args.save {
        handlers::submit::run(&client, &printer, SubmitKind::Save, script, &args.files, args.out.as_deref()).await?
    } else if let Some(target) = args.show.as_deref() {
        handlers::show::run(&client, &printer, target).await?
    } else if let Some(target) = args.replot.as_deref() {
        handlers::replot::run(&client, &printer, target, &args.files).await?
    } else if let Some(target) = args.image.as_deref() {
        let req = ImageRequest { format: args.format, width: args.width, height: args.height };
        match args.out.as_deref() {
            Some(out) => handlers::image::run(&client, target, req, out).await?,
            None => anyhow::bail!("--image needs --out PATH"),
        }
    } else {
        handlers::edit::run(&cfg, client, script, &args.files, args.open.as_deref()).await?;
        true
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
