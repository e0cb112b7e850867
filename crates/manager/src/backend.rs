//! Store backend capability contract.
//!
//! One implementation per store. The backend performs the three
//! operations the manager cannot do itself: fetching live catalog data,
//! submitting a payment, and asking the store to replay completed
//! transactions. Everything else (precondition checks, the registry,
//! event fan-out) stays in the manager.

use iapbridge_core::{ProductInfo, PurchaseError};

/// Outcome of a catalog fetch: the products the store resolved, plus
/// the sublist of requested ids it could not resolve.
#[derive(Debug, Clone, Default)]
pub struct CatalogResponse {
    pub resolved: Vec<ProductInfo>,
    pub unresolved: Vec<String>,
}

pub type CatalogResult = Result<CatalogResponse, PurchaseError>;

/// Completion callback for a catalog fetch. Invoked at most once, after
/// the fetch finishes — no partial delivery.
pub type CatalogCallback = Box<dyn FnOnce(CatalogResult) + Send + 'static>;

/// Capability interface a store backend must implement.
///
/// Adapters translate backend-native success/failure into the unified
/// model at this boundary; a raw store error must never cross into
/// application code unwrapped.
pub trait StoreBackend: Send + Sync {
    /// Static platform capability.
    fn is_supported(&self) -> bool;

    /// Dynamic capability; may depend on parental controls or account
    /// state.
    fn can_make_payments(&self) -> bool;

    /// Query the store's live catalog. Backend-specific metadata
    /// (currency-formatted price, downloadable flag) is normalized into
    /// [`ProductInfo`] here.
    fn fetch_catalog(&self, product_ids: Vec<String>, completion: CatalogCallback);

    /// Enqueue a payment with the store's transaction queue.
    /// Fire-and-forget: never blocks; submission-time errors surface
    /// asynchronously through the transaction observer.
    fn submit_payment(&self, product: &ProductInfo, quantity: u32);

    /// Ask the store to replay previously completed transactions
    /// through the observer. Fire-and-forget.
    fn submit_restore(&self);
}

impl<B> StoreBackend for std::sync::Arc<B>
where
    B: StoreBackend + ?Sized,
{
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn can_make_payments(&self) -> bool {
        (**self).can_make_payments()
    }

    fn fetch_catalog(&self, product_ids: Vec<String>, completion: CatalogCallback) {
        (**self).fetch_catalog(product_ids, completion)
    }

    fn submit_payment(&self, product: &ProductInfo, quantity: u32) {
        (**self).submit_payment(product, quantity)
    }

    fn submit_restore(&self) {
        (**self).submit_restore()
    }
}
