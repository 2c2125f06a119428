//! Maze viewer server
//!
//! Polls a third-party maze game for player snapshots, turns each snapshot
//! into a north-up grid of renderable cells, and proxies the game's player
//! and lifecycle endpoints.

pub mod app;
pub mod config;
pub mod http;
pub mod maze;
pub mod poll;
pub mod upstream;
pub mod util;
pub mod viewer;
