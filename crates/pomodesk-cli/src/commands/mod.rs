pub mod button;
pub mod config;
pub mod daemon;
pub mod preset;
pub mod send;
pub mod stats;
