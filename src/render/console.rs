//! Shell for a terminal session

use crate::view::Shell;
use std::sync::Mutex;

/// Notices go to stderr; navigation becomes a sign-in prompt
///
/// The CLI has no browser to redirect, so the last requested location is
/// kept for the caller to act on.
pub struct ConsoleShell {
    base_url: String,
    location: String,
    navigated: Mutex<Option<String>>,
}

impl ConsoleShell {
    pub fn new(base_url: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            location: location.into(),
            navigated: Mutex::new(None),
        }
    }

    /// Where the dashboard was last sent, if anywhere
    pub fn navigated_to(&self) -> Option<String> {
        self.navigated.lock().ok().and_then(|n| n.clone())
    }
}

impl Shell for ConsoleShell {
    fn notify(&self, message: &str) {
        tracing::info!(notice = message, "Notice");
        eprintln!("{}", message);
    }

    fn navigate(&self, location: &str) {
        tracing::warn!(location, "Session expired");
        eprintln!("Session expired. Sign in at {}{}", self.base_url, location);
        if let Ok(mut navigated) = self.navigated.lock() {
            *navigated = Some(location.to_string());
        }
    }

    fn current_location(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_navigation() {
        let shell = ConsoleShell::new("http://localhost:5000/", "/admin");
        assert_eq!(shell.current_location(), "/admin");
        assert!(shell.navigated_to().is_none());

        shell.notify("Saved");
        shell.navigate("/admin/login?next=%2Fadmin");
        assert_eq!(shell.navigated_to().as_deref(), Some("/admin/login?next=%2Fadmin"));
    }
}
