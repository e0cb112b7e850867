//! Scriptable in-memory implementation of the store boundary.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use iapbridge_core::PurchaseError;
use iapbridge_store::{
    NoticeCallback, ObserverHandle, QueryCallback, StoreCatalog, StoreProduct, StoreService,
    Transaction, TransactionNotice, TransactionRef, TransactionState,
};

#[derive(Default)]
struct State {
    catalog: BTreeMap<String, StoreProduct>,
    catalog_fault: Option<PurchaseError>,
    observer: Option<NoticeCallback>,
    registrations: u64,
    pending: Vec<Transaction>,
    finished: Vec<TransactionRef>,
}

/// In-memory store service.
///
/// Catalog queries answer synchronously from a configured product
/// table. Payments queue as `Pending` transactions until a test/dev
/// driver settles or fails them; every notice goes through the
/// registered observer exactly like a real transaction queue would.
pub struct MemoryStore {
    supported: bool,
    payments_enabled: bool,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            supported: true,
            payments_enabled: true,
            state: Mutex::new(State::default()),
        }
    }

    /// Add a full catalog row.
    pub fn with_product(self, product: StoreProduct) -> Self {
        self.lock().catalog.insert(product.product_id.clone(), product);
        self
    }

    /// Convenience row with price-derived localized text.
    pub fn with_priced_product(self, product_id: &str, title: &str, price: f64) -> Self {
        self.with_product(StoreProduct {
            product_id: product_id.to_string(),
            title: title.to_string(),
            description: format!("{title} description"),
            price,
            localized_price: format!("${price:.2}"),
            downloadable: false,
            download_content_version: String::new(),
        })
    }

    pub fn with_supported(mut self, supported: bool) -> Self {
        self.supported = supported;
        self
    }

    pub fn with_payments_enabled(mut self, enabled: bool) -> Self {
        self.payments_enabled = enabled;
        self
    }

    /// Script every catalog query to fail with this error.
    pub fn with_catalog_fault(self, fault: PurchaseError) -> Self {
        self.lock().catalog_fault = Some(fault);
        self
    }

    // ---- drivers -------------------------------------------------------

    /// Resolve every pending payment as purchased, delivered as one
    /// batch. Returns the number settled.
    pub fn settle_all(&self) -> usize {
        let batch: Vec<Transaction> = {
            let mut state = self.lock();
            state
                .pending
                .drain(..)
                .map(|mut tx| {
                    tx.state = TransactionState::Purchased;
                    tx
                })
                .collect()
        };
        let settled = batch.len();
        if settled > 0 {
            self.deliver(TransactionNotice::Updated(batch));
        }
        settled
    }

    /// Fail the oldest pending payment. Returns false when nothing is
    /// pending.
    pub fn fail_next(&self, code: i64, message: &str) -> bool {
        let tx = {
            let mut state = self.lock();
            if state.pending.is_empty() {
                None
            } else {
                Some(state.pending.remove(0))
            }
        };
        match tx {
            Some(mut tx) => {
                tx.state = TransactionState::Failed;
                tx = tx.with_fault(code, message);
                self.deliver(TransactionNotice::Updated(vec![tx]));
                true
            }
            None => false,
        }
    }

    /// Push an arbitrary notice through the observer, as the store's
    /// transaction queue would.
    pub fn deliver(&self, notice: TransactionNotice) {
        // Invoke outside the lock: the observer calls back into
        // finish_transaction.
        let observer = self.lock().observer.clone();
        if let Some(observer) = observer {
            observer(notice);
        } else {
            debug!("notice dropped; no transaction observer registered");
        }
    }

    /// Signal the end of a successful restore session.
    pub fn complete_restore(&self) {
        self.deliver(TransactionNotice::RestoreCompleted);
    }

    pub fn fail_restore(&self, error: PurchaseError) {
        self.deliver(TransactionNotice::RestoreFailed(error));
    }

    // ---- inspection ----------------------------------------------------

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// References acknowledged via `finish_transaction`, in call order.
    pub fn finished(&self) -> Vec<TransactionRef> {
        self.lock().finished.clone()
    }

    pub fn observer_count(&self) -> u64 {
        self.lock().registrations
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreService for MemoryStore {
    fn is_iap_supported(&self) -> bool {
        self.supported
    }

    fn can_make_payments(&self) -> bool {
        self.payments_enabled
    }

    fn query_products(&self, product_ids: BTreeSet<String>, completion: QueryCallback) {
        let result = {
            let state = self.lock();
            match &state.catalog_fault {
                Some(fault) => Err(fault.clone()),
                None => {
                    let mut catalog = StoreCatalog::default();
                    for id in product_ids {
                        match state.catalog.get(&id) {
                            Some(product) => catalog.products.push(product.clone()),
                            None => catalog.invalid_ids.push(id),
                        }
                    }
                    Ok(catalog)
                }
            }
        };
        completion(result);
    }

    fn add_payment(&self, product_id: &str, quantity: u32) {
        let tx = Transaction::new(TransactionState::Pending, product_id, quantity);
        debug!(%product_id, quantity, reference = %tx.reference, "payment enqueued");
        self.lock().pending.push(tx.clone());
        // Real queues announce the pending state too; observers ignore it.
        self.deliver(TransactionNotice::Updated(vec![tx]));
    }

    fn restore_completed_transactions(&self) {
        // Nothing recorded by default; tests drive restored
        // transactions explicitly through `deliver`.
        debug!("restore requested");
    }

    fn register_transaction_observer(&self, callback: NoticeCallback) -> ObserverHandle {
        let mut state = self.lock();
        state.registrations += 1;
        state.observer = Some(callback);
        ObserverHandle::new(state.registrations)
    }

    fn finish_transaction(&self, reference: TransactionRef) {
        let mut state = self.lock();
        state.pending.retain(|tx| tx.reference != reference);
        state.finished.push(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn collecting_observer() -> (NoticeCallback, Arc<Mutex<Vec<TransactionNotice>>>) {
        let seen: Arc<Mutex<Vec<TransactionNotice>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: NoticeCallback = Arc::new(move |notice| {
            sink.lock().unwrap().push(notice);
        });
        (callback, seen)
    }

    #[test]
    fn query_splits_resolved_and_invalid_ids() {
        let store = MemoryStore::new().with_priced_product("p1", "Widget", 0.99);

        let result = Arc::new(Mutex::new(None));
        let slot = result.clone();
        store.query_products(
            ["p1".to_string(), "missing".to_string()].into(),
            Box::new(move |r| {
                *slot.lock().unwrap() = Some(r);
            }),
        );

        let catalog = result.lock().unwrap().take().unwrap().unwrap();
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products[0].title, "Widget");
        assert_eq!(catalog.invalid_ids, vec!["missing".to_string()]);
    }

    #[test]
    fn scripted_fault_fails_every_query() {
        let store =
            MemoryStore::new().with_catalog_fault(PurchaseError::new("store offline", 7));

        for _ in 0..2 {
            let result = Arc::new(Mutex::new(None));
            let slot = result.clone();
            store.query_products(
                ["p1".to_string()].into(),
                Box::new(move |r| {
                    *slot.lock().unwrap() = Some(r);
                }),
            );
            let err = result.lock().unwrap().take().unwrap().unwrap_err();
            assert_eq!(err.code(), 7);
        }
    }

    #[test]
    fn payments_stay_pending_until_settled() {
        let store = MemoryStore::new();
        let (observer, seen) = collecting_observer();
        store.register_transaction_observer(observer);

        store.add_payment("p1", 2);
        assert_eq!(store.pending_count(), 1);

        // The enqueue announcement carries a pending transaction.
        match &seen.lock().unwrap()[0] {
            TransactionNotice::Updated(batch) => {
                assert_eq!(batch[0].state, TransactionState::Pending)
            }
            other => panic!("unexpected notice {other:?}"),
        }

        assert_eq!(store.settle_all(), 1);
        assert_eq!(store.pending_count(), 0);
        match &seen.lock().unwrap()[1] {
            TransactionNotice::Updated(batch) => {
                assert_eq!(batch[0].state, TransactionState::Purchased);
                assert_eq!(batch[0].payment.product_id, "p1");
                assert_eq!(batch[0].payment.quantity, 2);
            }
            other => panic!("unexpected notice {other:?}"),
        }
    }

    #[test]
    fn fail_next_attaches_the_fault() {
        let store = MemoryStore::new();
        let (observer, seen) = collecting_observer();
        store.register_transaction_observer(observer);

        store.add_payment("p1", 1);
        assert!(store.fail_next(2, "user backed out"));
        assert!(!store.fail_next(2, "nothing left"));

        match &seen.lock().unwrap()[1] {
            TransactionNotice::Updated(batch) => {
                assert_eq!(batch[0].state, TransactionState::Failed);
                let fault = batch[0].fault.as_ref().unwrap();
                assert_eq!(fault.code, 2);
            }
            other => panic!("unexpected notice {other:?}"),
        }
    }

    #[test]
    fn finish_records_references_in_order() {
        let store = MemoryStore::new();
        let a = TransactionRef::new();
        let b = TransactionRef::new();
        store.finish_transaction(a);
        store.finish_transaction(b);
        assert_eq!(store.finished(), vec![a, b]);
    }

    #[test]
    fn registration_replaces_the_observer() {
        let store = MemoryStore::new();
        let (first, first_seen) = collecting_observer();
        let (second, second_seen) = collecting_observer();
        store.register_transaction_observer(first);
        store.register_transaction_observer(second);
        assert_eq!(store.observer_count(), 2);

        store.complete_restore();
        assert!(first_seen.lock().unwrap().is_empty());
        assert_eq!(second_seen.lock().unwrap().len(), 1);
    }
}
