//! LINEHAWK — sports-betting arbitrage scanner.
//!
//! Collects decimal odds from The Odds API, normalizes them into
//! canonical quotes, groups quotes by handicap/total line, detects
//! combinations whose implied probabilities sum below 1, and serves the
//! findings (plus stake splits) over a small HTTP API. Collection runs
//! under a monthly request quota and a per-sweep wall-clock budget.

pub mod api;
pub mod collector;
pub mod config;
pub mod detect;
pub mod error;
pub mod feed;
pub mod grouping;
pub mod normalize;
pub mod scheduler;
pub mod stakes;
pub mod store;
pub mod types;
