//! Capture of cookies from tunneled responses.
//!
//! - [`parse_set_cookie`] turns one `Set-Cookie` value into a jar record.
//! - [`InterceptionBridge`] queues parsed cookies and persists them in the
//!   background so response delivery never waits on storage.

mod bridge;
mod set_cookie;

pub use bridge::{DEFAULT_QUEUE_CAPACITY, InterceptionBridge, ObserveSummary};
pub use set_cookie::{ParsedSetCookie, SetCookieError, parse_set_cookie};

pub(crate) use bridge::response_domain;
