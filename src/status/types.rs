/// Which kind of display is currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// No API token configured
    SetupRequired,
    /// First fetch in progress, nothing cached yet
    Loading,
    /// Fetch in progress, cached numbers shown
    Refreshing,
    /// Last fetch succeeded
    Normal,
    /// Last fetch failed
    Error,
}

/// Rendered output for the presentation surface
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub state: DisplayState,
    /// Single-line status text, indicator glyph included
    pub text: String,
    pub tooltip: String,
    pub error_styling: bool,
}

/// Where status views end up (status bar, terminal, tray, ...)
pub trait StatusSurface: Send + Sync {
    fn update(&self, view: &StatusView);
}

/// Prints each status line to stdout
#[derive(Default)]
pub struct TerminalSurface;

impl StatusSurface for TerminalSurface {
    fn update(&self, view: &StatusView) {
        if view.error_styling {
            log::warn!("{}", view.tooltip.replace('\n', " | "));
        } else {
            log::debug!("{}", view.tooltip.replace('\n', " | "));
        }
        println!("{}", view.text);
    }
}
