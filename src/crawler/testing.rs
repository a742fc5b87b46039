//! In-memory transport for unit tests

use super::transport::{HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reaction to a GET
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(u16, String),
    ConnectionError,
    Hang,
    Panic,
}

impl Scripted {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Respond(200, body.into())
    }

    pub fn status(code: u16) -> Self {
        Self::Respond(code, String::new())
    }
}

/// Replies to each URL from a queue; the last entry of a queue repeats
///
/// Unknown URLs get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, script: Vec<Scripted>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), script.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn next(&self, url: &str) -> Scripted {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Scripted::status(404)),
            None => Scripted::status(404),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.next(url) {
            Scripted::Respond(status, body) => Ok(HttpResponse { status, body }),
            Scripted::ConnectionError => {
                Err(TransportError::Connection("connection refused".to_string()))
            }
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(TransportError::Timeout)
            }
            Scripted::Panic => panic!("scripted transport panic for {}", url),
        }
    }
}
