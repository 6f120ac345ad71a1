//! Query/mutation cache between page containers and the Remote Job API.

pub mod client;
pub mod jobs;
pub mod key;

pub use client::{
    QueryClient, QueryError, QueryOptions, Subscription, DEFAULT_GC_TIME, DEFAULT_STALE_TIME,
};
pub use jobs::{JobQueries, JobQuery};
pub use key::QueryKey;
