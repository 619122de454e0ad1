pub mod progress_log;
pub mod publisher;
pub mod scheduler;
pub mod tile_fetcher;
