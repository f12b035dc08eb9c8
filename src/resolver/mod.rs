pub mod cache;
pub mod fetch;
pub mod resource;
pub mod trust;

pub use cache::UrlCache;
pub use fetch::{Fetcher, HttpFetcher, RemoteContent};
pub use resource::{ResolveContext, Resolver, ResourceRef};
pub use trust::{TrustPolicy, TrustStore};
