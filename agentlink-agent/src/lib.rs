pub mod client;
pub mod config;

pub use client::{run_agent, CommandHandler};
