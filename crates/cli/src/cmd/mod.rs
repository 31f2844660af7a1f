mod cache;
mod discover;

pub use cache::{CacheArgs, cmd_cache};
pub use discover::cmd_discover;
