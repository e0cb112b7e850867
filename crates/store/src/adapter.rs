//! Store backend adapter over a native store service.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use iapbridge_core::{ProductHandle, ProductInfo};
use iapbridge_manager::{CatalogCallback, CatalogResponse, EventSink, StoreBackend};

use crate::observer::TransactionObserver;
use crate::service::{ObserverHandle, StoreCatalog, StoreProduct, StoreService};

/// Implements the manager's backend contract on top of any
/// [`StoreService`].
///
/// The adapter owns the normalization of native catalog rows into
/// `ProductInfo` and the lifecycle of the single transaction observer,
/// which it registers lazily on the first payment or restore request
/// and never re-registers.
pub struct StoreAdapter<S: StoreService + 'static> {
    service: Arc<S>,
    sink: EventSink,
    observer: Mutex<Option<ObserverHandle>>,
}

impl<S: StoreService + 'static> StoreAdapter<S> {
    pub fn new(service: Arc<S>, sink: EventSink) -> Self {
        Self {
            service,
            sink,
            observer: Mutex::new(None),
        }
    }

    fn ensure_observer(&self) {
        let mut slot = self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            let observer =
                TransactionObserver::new(self.service.clone(), self.sink.clone());
            let handle = self
                .service
                .register_transaction_observer(Arc::new(move |notice| {
                    observer.handle_notice(notice)
                }));
            debug!(observer = handle.id(), "transaction observer registered");
            *slot = Some(handle);
        }
    }
}

/// Attach the native row to the canonical product as an opaque handle.
fn normalize(product: StoreProduct) -> ProductInfo {
    ProductInfo {
        product_id: product.product_id.clone(),
        title: product.title.clone(),
        description: product.description.clone(),
        price: product.price,
        localized_price: product.localized_price.clone(),
        is_downloadable: product.downloadable,
        download_content_version: product.download_content_version.clone(),
        valid: true,
        handle: Some(ProductHandle::new(product)),
    }
}

fn normalize_catalog(catalog: StoreCatalog) -> CatalogResponse {
    CatalogResponse {
        resolved: catalog.products.into_iter().map(normalize).collect(),
        unresolved: catalog.invalid_ids,
    }
}

impl<S: StoreService + 'static> StoreBackend for StoreAdapter<S> {
    fn is_supported(&self) -> bool {
        self.service.is_iap_supported()
    }

    fn can_make_payments(&self) -> bool {
        self.service.can_make_payments()
    }

    fn fetch_catalog(&self, product_ids: Vec<String>, completion: CatalogCallback) {
        let ids = product_ids.into_iter().collect();
        self.service.query_products(
            ids,
            Box::new(move |result| completion(result.map(normalize_catalog))),
        );
    }

    fn submit_payment(&self, product: &ProductInfo, quantity: u32) {
        self.ensure_observer();
        self.service.add_payment(&product.product_id, quantity);
    }

    fn submit_restore(&self) {
        self.ensure_observer();
        self.service.restore_completed_transactions();
    }
}
