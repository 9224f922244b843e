//! Plain-terminal rendering of results and share values.

use owo_colors::OwoColorize;

use crate::api::Outcome;
use crate::session::Session;

pub struct TextPrinter {
    pub color: Option<String>,
}

impl TextPrinter {
    pub fn new(color: Option<String>) -> Self {
        Self { color }
    }

    fn heading(&self, text: &str) -> String {
        match self.color.as_deref() {
            Some("green") => format!("{}", text.green()),
            Some("cyan") => format!("{}", text.cyan()),
            Some("magenta") => format!("{}", text.magenta()),
            Some("yellow") => format!("{}", text.yellow()),
            _ => text.to_string(),
        }
    }

    pub fn print_outcome(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { output, svg } => {
                if !output.is_empty() {
                    println!("{}", self.heading("output:"));
                    println!("{}", output.trim_end());
                }
                if !svg.is_empty() {
                    println!("{} {} bytes", self.heading("svg:"), svg.len());
                }
            }
            Outcome::Failure { error } => {
                eprintln!("{} {}", "error:".red().bold(), error.trim_end());
            }
        }
    }

    /// Edit URL, preview URL, image tag and replot example of a saved session.
    pub fn print_share(&self, session: &Session) {
        if session.id().is_empty() {
            return;
        }
        println!("{} {}", self.heading("edit:"), session.edit_url());
        println!("{} {}", self.heading("image:"), session.image_url());
        println!("{} {}", self.heading("html:"), session.html_image());
        let replot = session.replot_example();
        if !replot.is_empty() {
            println!("{} {}", self.heading("replot:"), replot);
        }
    }

    pub fn print_sources(&self, session: &Session) {
        println!("{}", self.heading("# main.R"));
        println!("{}", session.code().trim_end());
        for file in session.files() {
            println!();
            println!("{}", self.heading(&format!("# {}", file.name)));
            println!("{}", file.content.trim_end());
        }
    }
}
