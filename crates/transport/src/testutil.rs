//! Shared test fixtures: in-process mock upstream and a scripted transport.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use reqwest::header::{HeaderMap, HeaderValue, LINK};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::{Request, Response, Result, Transport};

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A 200 response with an optional `next` link.
pub fn page(body: Value, next: Option<&str>) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(next) = next {
        headers.insert(
            LINK,
            HeaderValue::from_str(&format!("<{next}>; rel=\"next\"")).unwrap(),
        );
    }
    Response {
        status: 200,
        headers,
        body,
    }
}

/// Transport that replays canned results in order and records every request.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Response>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Response>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted transport ran out of responses");
        Box::pin(async move { next })
    }
}
