//! The six lifecycle events of a purchase manager.

use iapbridge_core::{ProductInfo, PurchaseError};
use iapbridge_events::SubscriberSet;

/// Payload of a successful purchase or restored transaction.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub product: ProductInfo,
    pub quantity: u32,
}

/// Multicast event surface of a [`PurchaseManager`].
///
/// All six events are fire-and-forget: subscriber return values are
/// ignored and delivery goes through the manager's dispatcher.
///
/// [`PurchaseManager`]: crate::PurchaseManager
#[derive(Debug, Default)]
pub struct PurchaseEvents {
    /// The registry was resolved and the manager is ready to purchase.
    pub initialized: SubscriberSet<()>,
    /// Initialization did not produce a usable registry.
    pub initialization_failed: SubscriberSet<PurchaseError>,
    /// A transaction resolved to purchased or restored.
    pub purchase_succeed: SubscriberSet<PurchaseOutcome>,
    /// A purchase was rejected, locally or by the store.
    pub purchase_failed: SubscriberSet<PurchaseError>,
    /// The store finished replaying completed transactions.
    pub restore_succeed: SubscriberSet<()>,
    /// The restore session failed as a whole (reported once per
    /// session, not per transaction).
    pub restore_failed: SubscriberSet<PurchaseError>,
}

impl PurchaseEvents {
    pub fn new() -> Self {
        Self::default()
    }
}
