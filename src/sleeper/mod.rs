// Provider client: Sleeper league data, the full player directory, and
// third-party market valuations, behind process-lifetime TTL caches.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::{Clock, SystemClock, TtlCache};
pub use client::{LeagueProvider, ProviderError, SleeperClient};
