pub mod app;
pub mod cancel;
pub mod cli;
pub mod client;
pub mod config;
pub mod directory;
pub mod model;
pub mod output;
pub mod schedule;
pub mod session;

#[cfg(test)]
mod tests;
