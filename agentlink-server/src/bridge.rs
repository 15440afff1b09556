use std::sync::Arc;

use serde_json::Value;

use crate::config::BridgeSettings;
use crate::registry::AgentRegistry;
use crate::transactions::PendingTransactions;

/// Predicate applied to each identification reply before an agent is
/// registered. Returning false closes the connection without registering
/// anything.
pub type ConnectValidator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// One bridge instance: both registries, the dispatch settings, and the
/// injected connect validator. Constructed once and shared by reference
/// with every connection task and every dispatching caller.
pub struct Bridge {
    pub agents: AgentRegistry,
    pub transactions: PendingTransactions,
    pub settings: BridgeSettings,
    pub(crate) validator: ConnectValidator,
}

impl Bridge {
    /// Bridge that accepts every connecting agent.
    pub fn new(settings: BridgeSettings) -> Self {
        Self::with_validator(settings, Arc::new(|_: &Value| true))
    }

    pub fn with_validator(settings: BridgeSettings, validator: ConnectValidator) -> Self {
        Self {
            agents: AgentRegistry::new(),
            transactions: PendingTransactions::new(),
            settings,
            validator,
        }
    }
}
