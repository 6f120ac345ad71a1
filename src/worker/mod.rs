pub mod cache_janitor;

pub use cache_janitor::CacheJanitor;
