//! Navigation context: where the user currently is and how to send them to
//! the login entry point.

use std::sync::RwLock;

/// Current navigation path plus its query string (without the `?`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
}

impl Location {
    pub fn parse(target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) if !query.is_empty() => Self {
                path: path.to_string(),
                query: Some(query.to_string()),
            },
            Some((path, _)) => Self {
                path: path.to_string(),
                query: None,
            },
            None => Self {
                path: target.to_string(),
                query: None,
            },
        }
    }

    pub fn path_and_query(&self) -> String {
        match self.query {
            Some(ref query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

pub trait Navigator: Send + Sync {
    fn current_location(&self) -> Location;

    /// Full-page navigation to `url`.
    fn redirect(&self, url: &str);
}

/// `<login_path>?returnUrl=<encoded path+query>`
pub fn login_redirect_url(login_path: &str, location: &Location) -> String {
    format!(
        "{}?returnUrl={}",
        login_path,
        urlencoding::encode(&location.path_and_query())
    )
}

/// Navigator that keeps its location in memory and records every redirect.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    location: RwLock<Location>,
    redirects: RwLock<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: &str) -> Self {
        Self {
            location: RwLock::new(Location::parse(start)),
            redirects: RwLock::new(Vec::new()),
        }
    }

    pub fn navigate(&self, target: &str) {
        *self.location.write().unwrap_or_else(|e| e.into_inner()) = Location::parse(target);
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> Location {
        self.location.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn redirect(&self, url: &str) {
        self.redirects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        self.navigate(url);
    }
}
