use parking_lot::Mutex;

/// Sink for the login redirect emitted on unrecoverable auth failure.
///
/// The client never routes by itself; the host decides what "navigate" means
/// (a browser redirect, a CLI hint, a recorded event in tests).
pub trait Navigator: Send + Sync {
    /// Path plus query string the user is currently on
    fn current_location(&self) -> String;

    fn navigate(&self, target: &str);
}

/// Build `<login_path>?redirect=<percent-encoded location>`
pub fn login_redirect_url(login_path: &str, current_location: &str) -> String {
    format!(
        "{}?redirect={}",
        login_path,
        urlencoding::encode(current_location)
    )
}

/// Navigator that only logs the redirect
#[derive(Debug, Default)]
pub struct LogNavigator {
    location: String,
}

impl LogNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl Navigator for LogNavigator {
    fn current_location(&self) -> String {
        if self.location.is_empty() {
            "/".to_string()
        } else {
            self.location.clone()
        }
    }

    fn navigate(&self, target: &str) {
        tracing::info!(redirect = %target, "Login required");
    }
}

/// Navigator that remembers every redirect it was asked to perform
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    location: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.lock() = location.into();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.lock().len()
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> String {
        self.location.lock().clone()
    }

    fn navigate(&self, target: &str) {
        self.redirects.lock().push(target.to_string());
    }
}
