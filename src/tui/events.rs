//! Custom event types for TUI application.

use crossterm::event::KeyEvent;

use crate::api::{Outcome, PlotRecord, SaveReply};
use crate::session::Tab;

/// Events that can occur in the TUI application
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// Bracketed paste content
    Paste(String),
    /// Terminal was resized; redraw
    Resize,
    /// Saved record fetched (or a transport failure folded into it)
    Hydrated { id: String, record: PlotRecord },
    /// `POST /run` answered
    RunFinished { generation: u64, outcome: Outcome },
    /// `POST /plot` answered
    SaveFinished { generation: u64, reply: SaveReply },
    /// Delayed focus change after a tab was added
    Focus(Tab),
}
