//! `iapbridge-manager` — the purchase lifecycle state machine.
//!
//! A [`PurchaseManager`] gives application code one API over any store
//! backend: register product ids, initialize the catalog, purchase, and
//! restore. The actual payment processing is delegated to a
//! [`StoreBackend`]; outcomes come back asynchronously through the six
//! lifecycle events.
//!
//! Sequencing is the application's job: `initialize` before
//! `purchase_product`. No global ordering is guaranteed between
//! independent in-flight calls.

pub mod backend;
pub mod events;
pub mod manager;

pub use backend::{CatalogCallback, CatalogResponse, CatalogResult, StoreBackend};
pub use events::{PurchaseEvents, PurchaseOutcome};
pub use manager::{EventSink, PurchaseManager, RequestHandle};
