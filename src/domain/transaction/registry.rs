//! Connector transaction lookup interface

use super::model::Transaction;

/// Read-side view of the connectors' transaction state.
///
/// The composite schedule sweep is synchronous, so this lookup is too.
pub trait TransactionRegistry: Send + Sync {
    /// Number of physical connectors. Connector IDs run 1..=count;
    /// 0 addresses the charge point as a whole.
    fn connector_count(&self) -> u32;

    /// The active transaction on a connector, if any.
    fn active_transaction(&self, connector_id: u32) -> Option<Transaction>;
}
