//! Asynchronous hand-off from observed responses to the cookie store.
//!
//! `observe_*` calls parse synchronously and push one capture per response
//! onto a bounded queue; a single worker task drains the queue and merges
//! each capture through [`CookieStore::upsert_records`]. Callers never await
//! persistence, and a full queue drops the capture instead of blocking.

use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::identity::UserId;
use crate::jar::CookieRecord;
use crate::store::CookieStore;

use super::set_cookie::parse_set_cookie;

/// Default number of pending captures the queue holds.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Cookies observed on one response.
#[derive(Debug)]
struct Capture {
    user: UserId,
    domain: String,
    cookies: Vec<(String, CookieRecord)>,
}

/// Outcome of one `observe_*` call, counted in cookies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ObserveSummary {
    /// Parsed and handed to the worker.
    pub queued: usize,
    /// Malformed values, or values without a usable domain.
    pub skipped: usize,
    /// Parsed but discarded because the queue was full or closed.
    pub dropped: usize,
}

/// Cloneable handle feeding the persistence worker.
///
/// The worker exits once every handle is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct InterceptionBridge {
    sender: mpsc::Sender<Capture>,
}

impl InterceptionBridge {
    /// Starts the worker on the current runtime.
    ///
    /// A `capacity` of zero is raised to one.
    #[must_use]
    pub fn spawn(store: CookieStore, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(store, receiver));
        (Self { sender }, worker)
    }

    /// Queues every well-formed `Set-Cookie` value for `domain`.
    pub fn observe_set_cookies<I, S>(&self, user: &UserId, domain: &str, values: I) -> ObserveSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = ObserveSummary::default();
        let domain = domain.trim();
        let mut cookies = Vec::new();
        for raw in values {
            match parse_set_cookie(raw.as_ref()) {
                Ok(parsed) if !domain.is_empty() => cookies.push((parsed.name, parsed.record)),
                Ok(_) => summary.skipped += 1,
                Err(error) => {
                    debug!(domain, error = %error, "skipping malformed set-cookie value");
                    summary.skipped += 1;
                }
            }
        }
        if cookies.is_empty() {
            return summary;
        }

        let count = cookies.len();
        let capture = Capture {
            user: user.clone(),
            domain: domain.to_string(),
            cookies,
        };
        match self.sender.try_send(capture) {
            Ok(()) => summary.queued = count,
            Err(TrySendError::Full(capture)) => {
                warn!(
                    domain = %capture.domain,
                    cookies = count,
                    "cookie capture queue full; dropping capture"
                );
                summary.dropped = count;
            }
            Err(TrySendError::Closed(capture)) => {
                warn!(
                    domain = %capture.domain,
                    cookies = count,
                    "cookie persistence worker stopped; dropping capture"
                );
                summary.dropped = count;
            }
        }
        summary
    }

    /// Queues the `Set-Cookie` headers of a response fetched from `url`.
    ///
    /// The domain is the host of `url`. Header values that are not valid
    /// UTF-8 are skipped.
    pub fn observe_response(&self, user: &UserId, url: &str, headers: &HeaderMap) -> ObserveSummary {
        let mut values = Vec::new();
        let mut skipped = 0;
        for value in headers.get_all(SET_COOKIE) {
            match value.to_str() {
                Ok(text) => values.push(text),
                Err(_) => skipped += 1,
            }
        }

        let Some(domain) = response_domain(url) else {
            debug!(url, "response URL has no host; skipping its cookies");
            return ObserveSummary {
                skipped: skipped + values.len(),
                ..ObserveSummary::default()
            };
        };

        let mut summary = self.observe_set_cookies(user, &domain, values);
        summary.skipped += skipped;
        summary
    }
}

/// Host name of a response URL, used as the jar's domain key.
pub(crate) fn response_domain(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()?
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

async fn run_worker(store: CookieStore, mut receiver: mpsc::Receiver<Capture>) {
    let mut persisted: u64 = 0;
    while let Some(capture) = receiver.recv().await {
        debug!(
            user = %capture.user,
            domain = %capture.domain,
            cookies = capture.cookies.len(),
            "persisting captured cookies"
        );
        store
            .upsert_records(&capture.user, &capture.domain, capture.cookies)
            .await;
        persisted += 1;
    }
    info!(captures = persisted, "cookie persistence worker drained");
}
