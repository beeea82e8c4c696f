pub mod prefetch_refresh;
pub mod runner;

pub use prefetch_refresh::PrefetchRefreshJob;
pub use runner::JobRunner;
