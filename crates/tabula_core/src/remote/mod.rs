//! Remote collection reconciliation.
//!
//! The store never talks HTTP itself. It drives an [`HttpClient`]
//! implementation supplied by the caller, interprets status codes through
//! [`classify`], and remembers responses and refused methods in an
//! [`HttpCache`].

mod cache;
mod collection;
mod http;
mod mock;

pub use cache::{CachedResponse, HttpCache};
pub use collection::RemoteCollection;
pub use http::{classify, HttpClient, HttpResponse, Method, Permissions};
pub use mock::{MockHttpClient, RecordedRequest};
