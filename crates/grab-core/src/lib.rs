pub mod cache;
pub mod clock;
pub mod error;
pub mod forges;
pub mod request;
pub mod resolver;
pub mod selector;

pub use cache::{CACHE_TTL_SECS, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ResolveError;
pub use forges::{Forge, ReleaseSource, new_forge};
pub use resolver::Resolver;
pub use selector::select_asset;

/// User Agent string for provider API calls
pub const USER_AGENT: &str = concat!("grab-core/", env!("CARGO_PKG_VERSION"));
