pub mod config;
pub mod tracker;

pub use tracker::Tracker;
