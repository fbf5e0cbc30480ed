//! Canned transport for orchestration tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use transport::{Request, Response, Transport};

/// What the mock does with one request.
pub enum Reply {
    Ok(Value),
    Err(transport::Error),
    /// Respond after a (virtual) delay
    Delayed(Duration, Value),
    /// Never complete
    Hang,
}

type Handler = Box<dyn Fn(&Request) -> Reply + Send + Sync>;

pub struct MockTransport {
    handler: Handler,
    authenticated: bool,
    requests: Mutex<Vec<Request>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    dropped: AtomicUsize,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&Request) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            authenticated: true,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.endpoint.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Tracks one outstanding call; counts a drop when it never completed.
struct InFlight<'a> {
    mock: &'a MockTransport,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn enter(mock: &'a MockTransport) -> Self {
        let now = mock.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        mock.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { mock, done: false }
    }

    fn finish(mut self) {
        self.done = true;
        self.mock.completed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.mock.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.done {
            self.mock.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn ok(body: Value) -> transport::Result<Response> {
    Ok(Response {
        status: 200,
        headers: Default::default(),
        body,
    })
}

impl Transport for MockTransport {
    fn id(&self) -> &str {
        "mock"
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = (self.handler)(request);
        Box::pin(async move {
            let guard = InFlight::enter(self);
            let result = match reply {
                Reply::Ok(body) => ok(body),
                Reply::Err(e) => Err(e),
                Reply::Delayed(delay, body) => {
                    tokio::time::sleep(delay).await;
                    ok(body)
                }
                Reply::Hang => std::future::pending().await,
            };
            guard.finish();
            result
        })
    }
}
