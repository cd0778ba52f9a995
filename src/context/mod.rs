//! Per-request context handed to route handlers.
//!
//! The router fills in [`PathParams`] when it matches a route; handlers read
//! them back by name through [`Context::param`].

use std::collections::HashMap;

use crate::Request;

/// Named path parameters captured from the matched route pattern.
///
/// # Examples
///
/// ```
/// use barehttp::context::PathParams;
///
/// let mut params = PathParams::new();
/// params.insert("name", "hello");
/// assert_eq!(params.get("name"), Some("hello"));
/// assert_eq!(params.get("id"), None);
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PathParams {
    map: HashMap<String, String>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a captured segment, replacing any earlier binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A request together with the parameters its route captured.
#[derive(Debug)]
pub struct Context {
    request: Request,
    params: PathParams,
}

impl Context {
    pub fn with_params(request: Request, params: PathParams) -> Self {
        Self { request, params }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the path parameter captured as `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the first value of request header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name)
    }
}
