//! Upstream maze game service

pub mod client;

pub use client::{bearer, CreateGame, Direction, GameCommand, Registration, UpstreamClient, UpstreamError};
