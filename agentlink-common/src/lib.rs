pub mod error;
pub mod protocol;

pub use error::AgentLinkError;
pub use protocol::{Challenge, Envelope, Frame, Identification, Reply};
