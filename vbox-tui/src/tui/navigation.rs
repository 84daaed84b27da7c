//! Screen history
//!
//! The stack only tracks frames; re-populating the screen that becomes current is
//! the caller's job (see `App`), so every transition here is plain state.

use crate::tui::types::{NavigationFrame, ScreenId};

#[derive(Debug, Clone)]
pub struct NavigationStack {
    history: Vec<NavigationFrame>,
    current: NavigationFrame,
}

impl NavigationStack {
    /// Start at `root` with no arguments, on top of the sentinel frame.
    pub fn new(root: ScreenId) -> Self {
        Self {
            history: vec![NavigationFrame::nil()],
            current: NavigationFrame::new(root, Vec::new()),
        }
    }

    pub fn current(&self) -> &NavigationFrame {
        &self.current
    }

    pub fn push(&mut self, screen: ScreenId, args: Vec<String>) -> &NavigationFrame {
        let previous = std::mem::replace(&mut self.current, NavigationFrame::new(screen, args));
        self.history.push(previous);
        &self.current
    }

    /// Go back one frame. Returns false (and changes nothing) at the root.
    pub fn pop(&mut self) -> bool {
        match self.history.last() {
            None => false,
            Some(top) if top.is_nil() => false,
            Some(_) => {
                if let Some(frame) = self.history.pop() {
                    self.current = frame;
                }
                true
            }
        }
    }

    pub fn is_root(&self) -> bool {
        self.history.last().is_none_or(NavigationFrame::is_nil)
    }

    /// Breadcrumb from the root to the current frame, e.g. `vm > props web`.
    pub fn trail(&self) -> String {
        self.history
            .iter()
            .chain(std::iter::once(&self.current))
            .filter(|f| !f.is_nil())
            .map(|f| {
                if f.args.is_empty() {
                    f.screen.to_string()
                } else {
                    format!("{} {}", f.screen, f.args.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}
