//! A `Transport` that replays canned responses.
//!
//! Responses are handed out in the order they were queued, and every request
//! is recorded so tests can assert on what the session sent. Running out of
//! responses is reported as a transport failure, which also makes "no
//! request was issued" easy to check.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Default)]
pub struct ReplayTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.push(HttpResponse::new(status, body));
        self
    }

    /// Queue a 200 response carrying `body`.
    pub fn respond_ok(self, body: impl Into<String>) -> Self {
        self.respond(200, body)
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses.borrow_mut().push_back(response);
    }

    /// Every request executed so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ReplayTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let endpoint = request.endpoint().to_string();
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport(format!("no canned response left for {endpoint}")))
    }
}
