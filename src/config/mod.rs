// src/config/mod.rs
pub mod feed;

pub use feed::FeedConfig;
