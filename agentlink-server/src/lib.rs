pub mod agent_side;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod registry;
pub mod transactions;

pub use bridge::{Bridge, ConnectValidator};
pub use dispatch::{Command, Request};
