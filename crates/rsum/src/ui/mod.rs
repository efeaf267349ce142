mod observer;
mod tracker;

pub use observer::ConsoleObserver;
pub use tracker::ProgressTracker;
