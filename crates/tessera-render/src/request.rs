//! Request, caller and session types.
//!
//! These are the interface to whatever HTTP layer hosts the site. A [`Request`]
//! carries what rendering needs from one incoming request: its method, path,
//! query and form parameters, and a handle to the caller's session.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::levels::{Levels, Status};

/// Session key holding the status a caller switched to.
pub const STATUS_SESSION_KEY: &str = "status";

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// Per-caller storage that outlives one request.
pub trait Session: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn insert(&self, key: &str, value: String);
    fn remove(&self, key: &str) -> Option<String>;
}

/// An in-process [`Session`].
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn insert(&self, key: &str, value: String) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.remove(key)
    }
}

/// Where a submission marker was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The marker is a query parameter: the trigger was followed.
    Query,
    /// The marker is a form field: a form was submitted.
    Form,
}

/// One incoming request.
#[derive(Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub session: Arc<dyn Session>,
}

impl Request {
    /// A GET request with a fresh in-memory session.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: BTreeMap::new(),
            form: BTreeMap::new(),
            session: Arc::new(MemorySession::new()),
        }
    }

    /// A POST request with a fresh in-memory session.
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = session;
        self
    }

    /// Reports whether, and how, the given marker was submitted.
    ///
    /// A form submission wins over a query parameter with the same key.
    pub fn submission(&self, marker: &str) -> Option<Submission> {
        if self.method == Method::Post && self.form.contains_key(marker) {
            Some(Submission::Form)
        } else if self.query.contains_key(marker) {
            Some(Submission::Query)
        } else {
            None
        }
    }

    /// Reads a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

/// Who is rendering: a current status and the highest one they may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub status: Status,
    pub max_status: Status,
}

impl Caller {
    /// An unauthenticated caller: the lowest status, with no room to rise.
    pub fn anonymous() -> Self {
        Self::new(Status::LOWEST, Status::LOWEST)
    }

    /// A caller at `status`, entitled to at most `max_status`.
    ///
    /// A status above the maximum is clamped.
    pub fn new(status: Status, max_status: Status) -> Self {
        Self {
            status: status.min(max_status),
            max_status,
        }
    }

    /// An authenticated caller entitled to `max_status`, acting at the status
    /// saved in their session.
    ///
    /// Without a saved status (or with an unknown one) the caller acts at the
    /// lowest status until they elevate.
    pub fn from_session(levels: &Levels, max_status: Status, session: &dyn Session) -> Self {
        let saved = session
            .get(STATUS_SESSION_KEY)
            .and_then(|name| levels.statuses().get(&name))
            .unwrap_or(Status::LOWEST);
        Self::new(saved, max_status)
    }

    /// Raises (or lowers) the current status, never past the maximum.
    pub fn elevate(&mut self, status: Status) {
        self.status = status.min(self.max_status);
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::anonymous()
    }
}
