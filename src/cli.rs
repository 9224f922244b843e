use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::api::ImageFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "ggedit", about = "Edit, run and share ggplot2 plots on a plotting server", version)]
#[command(group(ArgGroup::new("mode").args(["run", "save", "show", "replot", "image"]).multiple(false)))]
pub struct Cli {
    /// R script to load as the main code.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Auxiliary file as NAME=PATH (or PATH, named after its stem).
    /// Can be used multiple times: --file iris=iris.csv --file extra.txt
    #[arg(short = 'f', long = "file", action = clap::ArgAction::Append)]
    pub files: Vec<String>,

    /// Open a saved plot by id or by its .../edit/<id> URL in the editor.
    #[arg(short = 'o', long = "open", value_name = "ID|URL", conflicts_with_all = ["script", "files", "mode"])]
    pub open: Option<String>,

    /// Run the script once on the server and print the result.
    #[arg(short = 'r', long)]
    pub run: bool,

    /// Save the script as a new plot and print its share links.
    #[arg(short = 's', long)]
    pub save: bool,

    /// Print the code and files of a saved plot.
    #[arg(long, value_name = "ID|URL")]
    pub show: Option<String>,

    /// Re-run a saved plot with the given --file contents replaced.
    #[arg(long, value_name = "ID|URL")]
    pub replot: Option<String>,

    /// Download the rendered image of a saved plot (requires --out).
    #[arg(long, value_name = "ID|URL", requires = "out")]
    pub image: Option<String>,

    /// Image format for --image.
    #[arg(long, value_enum, default_value_t = ImageFormat::Svg)]
    pub format: ImageFormat,

    /// Width scale for --image.
    #[arg(long, value_parser = clap::value_parser!(f64))]
    pub width: Option<f64>,

    /// Height scale for --image.
    #[arg(long, value_parser = clap::value_parser!(f64))]
    pub height: Option<f64>,

    /// Write the resulting image here.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Plotting server base URL (overrides API_BASE_URL).
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
