pub mod app;
pub mod cli;
pub mod client;
pub mod command;
pub mod config;
pub mod keystore;
pub mod output;
pub mod relay;
pub mod request;
pub mod runner;
pub mod session;
pub mod status;
pub mod utils;
pub mod view;

#[cfg(test)]
mod tests;
