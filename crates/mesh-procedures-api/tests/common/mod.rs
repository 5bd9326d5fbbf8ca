// crates/mesh-procedures-api/tests/common/mod.rs
// ============================================================================
// Module: API Test Helpers
// Description: One-shot tiny_http servers that capture the request they see.
// ============================================================================

//! Shared helpers for HTTP adapter tests.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::thread;
use std::thread::JoinHandle;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Request observed by a one-shot server.
#[derive(Debug, Default)]
pub struct Captured {
    /// HTTP method.
    pub method: String,
    /// Path and query.
    pub url: String,
    /// Header name and value pairs, names lowercased.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: String,
}

impl Captured {
    /// Returns the first header value with the given lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(field, _)| field == name).map(|(_, value)| value.as_str())
    }
}

/// Canned response served once.
pub struct Reply {
    /// Status code.
    pub status: u16,
    /// Body bytes.
    pub body: Vec<u8>,
    /// Extra headers.
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    /// JSON reply.
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            headers: vec![("Content-Type", "application/json".to_string())],
        }
    }

    /// Plain-text reply.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            headers: Vec::new(),
        }
    }
}

/// Serves one request and returns the base URL plus a handle yielding it.
pub fn serve_once(reply: Reply) -> (String, JoinHandle<Captured>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let base = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let Ok(mut request) = server.recv() else {
            return Captured::default();
        };
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let captured = Captured {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers: request
                .headers()
                .iter()
                .map(|header| {
                    (header.field.as_str().as_str().to_ascii_lowercase(), header.value.to_string())
                })
                .collect(),
            body,
        };
        let mut response = Response::from_data(reply.body).with_status_code(reply.status);
        for (name, value) in reply.headers {
            response.add_header(Header::from_bytes(name, value.as_bytes()).expect("header"));
        }
        // The client may hang up early, e.g. on oversized responses.
        let _ = request.respond(response);
        captured
    });
    (base, handle)
}
