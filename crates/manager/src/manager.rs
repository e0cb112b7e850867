//! Purchase manager core: registry, preconditions, orchestration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use iapbridge_core::{IapError, IapResult, ProductInfo, PurchaseError};
use iapbridge_events::EventDispatcher;

use crate::backend::{CatalogCallback, CatalogResponse, CatalogResult, StoreBackend};
use crate::events::{PurchaseEvents, PurchaseOutcome};

/// Product registry plus the initialization flag.
///
/// Guarded by one mutex: store callbacks may resolve on a different
/// thread than the one reading `products`.
#[derive(Debug, Default)]
struct Registry {
    products: HashMap<String, ProductInfo>,
    initialized: bool,
}

/// State shared between the manager, its event sink, and in-flight
/// completion callbacks.
struct Shared {
    registry: Mutex<Registry>,
    events: PurchaseEvents,
    dispatcher: Arc<dyn EventDispatcher>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a resolved catalog to the registry and flip the
    /// initialization flag. Only this path ever sets `initialized`.
    fn complete_initialization(&self, response: CatalogResponse) {
        let usable = {
            let mut registry = self.registry();
            for product in response.resolved {
                registry.products.insert(product.product_id.clone(), product);
            }
            for id in response.unresolved {
                warn!(product_id = %id, "product id is not valid");
                registry.products.insert(id.clone(), ProductInfo::invalid(id));
            }
            // Initialization only counts if something actually resolved:
            // a registry of nothing but invalid sentinels is unusable.
            let usable = registry.products.values().any(|p| p.valid);
            registry.initialized = usable;
            usable
        };

        if usable {
            self.events.initialized.emit((), self.dispatcher.as_ref());
        } else {
            warn!("initialization resolved no valid products");
            self.events.initialization_failed.emit(
                PurchaseError::local("no valid products were resolved"),
                self.dispatcher.as_ref(),
            );
        }
    }
}

/// Feedback handle a backend uses to report asynchronous transaction
/// outcomes into the manager's events.
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<Shared>,
}

impl EventSink {
    /// Report a purchased or restored transaction. The product is
    /// resolved from the registry; an id the registry has never seen
    /// falls back to a placeholder entry so the event still fires.
    pub fn purchase_succeed(&self, product_id: &str, quantity: u32) {
        let product = self
            .shared
            .registry()
            .products
            .get(product_id)
            .cloned()
            .unwrap_or_else(|| ProductInfo::placeholder(product_id));
        debug!(product_id, quantity, "purchase succeeded");
        self.shared
            .events
            .purchase_succeed
            .emit(PurchaseOutcome { product, quantity }, self.shared.dispatcher.as_ref());
    }

    pub fn purchase_failed(&self, error: PurchaseError) {
        warn!(code = error.code(), "purchase failed: {}", error.message());
        self.shared
            .events
            .purchase_failed
            .emit(error, self.shared.dispatcher.as_ref());
    }

    pub fn restore_succeed(&self) {
        debug!("restore completed");
        self.shared
            .events
            .restore_succeed
            .emit((), self.shared.dispatcher.as_ref());
    }

    pub fn restore_failed(&self, error: PurchaseError) {
        warn!(code = error.code(), "restore failed: {}", error.message());
        self.shared
            .events
            .restore_failed
            .emit(error, self.shared.dispatcher.as_ref());
    }
}

/// Cancellation token for an in-flight catalog request.
///
/// Cancelling does not abort the store request; it suppresses delivery
/// of the completion callback if the request later resolves.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    cancelled: Arc<AtomicBool>,
}

impl RequestHandle {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cross-platform facade over one store backend.
///
/// Construction is explicit dependency injection: the backend factory
/// receives the [`EventSink`] it will later report transaction outcomes
/// through. Hold one manager per process as an application convention.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use iapbridge_events::InlineDispatcher;
/// # use iapbridge_manager::{PurchaseManager, StoreBackend, EventSink};
/// # fn make(sink: EventSink) -> Arc<dyn StoreBackend> { unimplemented!() }
/// let manager = PurchaseManager::new(Arc::new(InlineDispatcher::new()), make);
/// manager.add_product_identifier("com.company.productone")?;
/// manager.initialize()?;
/// # Ok::<(), iapbridge_core::IapError>(())
/// ```
pub struct PurchaseManager {
    shared: Arc<Shared>,
    backend: Arc<dyn StoreBackend>,
}

impl PurchaseManager {
    pub fn new<B, F>(dispatcher: Arc<dyn EventDispatcher>, make_backend: F) -> Self
    where
        B: StoreBackend + 'static,
        F: FnOnce(EventSink) -> B,
    {
        let shared = Arc::new(Shared {
            registry: Mutex::new(Registry::default()),
            events: PurchaseEvents::new(),
            dispatcher,
        });
        let sink = EventSink {
            shared: shared.clone(),
        };
        let backend = Arc::new(make_backend(sink));
        Self { shared, backend }
    }

    /// True if the platform supports in-app purchases at all.
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// True if payments are currently possible on this device/account.
    pub fn can_make_payments(&self) -> bool {
        self.backend.can_make_payments()
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.registry().initialized
    }

    /// Snapshot of the current registry values.
    pub fn products(&self) -> Vec<ProductInfo> {
        self.shared.registry().products.values().cloned().collect()
    }

    /// The six lifecycle events; subscribe/unsubscribe here.
    pub fn events(&self) -> &PurchaseEvents {
        &self.shared.events
    }

    /// Register a product id ahead of initialization.
    ///
    /// Idempotent: a duplicate id leaves the registry unchanged. Any
    /// add invalidates a prior initialization, since the registry shape
    /// changed.
    pub fn add_product_identifier(&self, product_id: &str) -> IapResult<()> {
        if product_id.trim().is_empty() {
            return Err(IapError::invalid_argument("product id must not be blank"));
        }
        let mut registry = self.shared.registry();
        registry.initialized = false;
        registry
            .products
            .entry(product_id.to_owned())
            .or_insert_with(|| ProductInfo::placeholder(product_id));
        Ok(())
    }

    /// Fetch catalog information without touching the registry.
    ///
    /// The completion callback fires at most once, with either the
    /// resolved/unresolved split or a unified [`PurchaseError`].
    /// Returns a [`RequestHandle`] that can suppress delivery.
    pub fn request_product_information(
        &self,
        product_ids: Vec<String>,
        on_complete: impl FnOnce(CatalogResult) + Send + 'static,
    ) -> IapResult<RequestHandle> {
        if product_ids.is_empty() {
            return Err(IapError::invalid_argument(
                "at least one product id is required",
            ));
        }
        if product_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(IapError::invalid_argument("product id must not be blank"));
        }

        let handle = RequestHandle::new();
        let flag = handle.cancelled.clone();
        let completion: CatalogCallback = Box::new(move |result| {
            if flag.load(Ordering::SeqCst) {
                debug!("catalog request was cancelled; dropping completion");
                return;
            }
            on_complete(result);
        });

        debug!(count = product_ids.len(), "requesting product information");
        self.backend.fetch_catalog(product_ids, completion);
        Ok(handle)
    }

    /// Single-id convenience over [`request_product_information`].
    ///
    /// [`request_product_information`]: Self::request_product_information
    pub fn request_product(
        &self,
        product_id: &str,
        on_complete: impl FnOnce(CatalogResult) + Send + 'static,
    ) -> IapResult<RequestHandle> {
        if product_id.trim().is_empty() {
            return Err(IapError::invalid_argument("product id must not be blank"));
        }
        self.request_product_information(vec![product_id.to_owned()], on_complete)
    }

    /// Initialize using every currently registered id.
    pub fn initialize(&self) -> IapResult<()> {
        let product_ids: Vec<String> = self.shared.registry().products.keys().cloned().collect();
        if product_ids.is_empty() {
            return Err(IapError::invalid_state(
                "at least one product id is required",
            ));
        }
        self.initialize_with(product_ids)
    }

    /// Initialize with an explicit id list.
    ///
    /// Resolution is asynchronous: the outcome arrives as either the
    /// `initialized` or the `initialization_failed` event. Resolved
    /// products overwrite registry entries; unresolved ids become
    /// invalid sentinels.
    pub fn initialize_with(&self, product_ids: Vec<String>) -> IapResult<()> {
        if product_ids.is_empty() {
            return Err(IapError::invalid_argument(
                "at least one product id is required",
            ));
        }

        self.shared.registry().initialized = false;

        let shared = self.shared.clone();
        self.backend.fetch_catalog(
            product_ids,
            Box::new(move |result| match result {
                Ok(response) => shared.complete_initialization(response),
                Err(error) => {
                    warn!(code = error.code(), "catalog fetch failed: {}", error.message());
                    shared
                        .events
                        .initialization_failed
                        .emit(error, shared.dispatcher.as_ref());
                }
            }),
        );
        Ok(())
    }

    /// Purchase one unit of a product.
    pub fn purchase_product(&self, product_id: &str) -> IapResult<()> {
        self.purchase_product_with_quantity(product_id, 1)
    }

    /// Submit a payment for `quantity` units of a product.
    ///
    /// Deterministic precondition failures (blank id, unknown id, zero
    /// quantity, unsupported platform, payments disabled) fail fast
    /// here. The not-initialized and invalid-product cases are instead
    /// delivered through the `purchase_failed` event, for parity with
    /// real asynchronous payment failures.
    pub fn purchase_product_with_quantity(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> IapResult<()> {
        if product_id.trim().is_empty() {
            return Err(IapError::invalid_argument("product id must not be blank"));
        }

        let (entry, initialized) = {
            let registry = self.shared.registry();
            (
                registry.products.get(product_id).cloned(),
                registry.initialized,
            )
        };

        let Some(product) = entry else {
            return Err(IapError::invalid_state(format!(
                "product id '{product_id}' not found in current product list"
            )));
        };
        if quantity == 0 {
            return Err(IapError::invalid_argument(
                "quantity must be greater than zero",
            ));
        }
        if !self.backend.is_supported() {
            return Err(IapError::Unsupported);
        }
        if !self.backend.can_make_payments() {
            return Err(IapError::invalid_state(
                "in-app purchases are disabled on this device",
            ));
        }

        if !initialized {
            self.sink().purchase_failed(PurchaseError::local(
                "purchase manager is not initialized",
            ));
            return Ok(());
        }

        if !product.valid {
            self.sink()
                .purchase_failed(PurchaseError::local("product is not valid"));
            return Ok(());
        }

        debug!(product_id, quantity, "submitting payment");
        self.backend.submit_payment(&product, quantity);
        Ok(())
    }

    /// Ask the store to replay previously completed transactions.
    ///
    /// Outcomes arrive later through `purchase_succeed` per transaction
    /// and `restore_succeed` / `restore_failed` per session.
    pub fn restore_purchases(&self) {
        debug!("requesting restore of completed transactions");
        self.backend.submit_restore();
    }

    fn sink(&self) -> EventSink {
        EventSink {
            shared: self.shared.clone(),
        }
    }
}

impl core::fmt::Debug for PurchaseManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let registry = self.shared.registry();
        f.debug_struct("PurchaseManager")
            .field("products", &registry.products.len())
            .field("initialized", &registry.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iapbridge_events::InlineDispatcher;
    use std::sync::Mutex;

    /// Scripted backend: either answers catalog fetches immediately or
    /// parks the completion for the test to fire later.
    struct ScriptedBackend {
        supported: bool,
        payments_enabled: bool,
        script: Mutex<Option<CatalogResult>>,
        parked: Mutex<Option<CatalogCallback>>,
        submitted: Mutex<Vec<(String, u32)>>,
        restores: Mutex<u32>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                supported: true,
                payments_enabled: true,
                script: Mutex::new(None),
                parked: Mutex::new(None),
                submitted: Mutex::new(Vec::new()),
                restores: Mutex::new(0),
            }
        }

        fn answering(result: CatalogResult) -> Self {
            let backend = Self::new();
            *backend.script.lock().unwrap() = Some(result);
            backend
        }

        fn resolved(products: Vec<ProductInfo>, unresolved: Vec<&str>) -> Self {
            Self::answering(Ok(CatalogResponse {
                resolved: products,
                unresolved: unresolved.into_iter().map(String::from).collect(),
            }))
        }
    }

    impl StoreBackend for ScriptedBackend {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn can_make_payments(&self) -> bool {
            self.payments_enabled
        }

        fn fetch_catalog(&self, _product_ids: Vec<String>, completion: CatalogCallback) {
            match self.script.lock().unwrap().take() {
                Some(result) => completion(result),
                None => *self.parked.lock().unwrap() = Some(completion),
            }
        }

        fn submit_payment(&self, product: &ProductInfo, quantity: u32) {
            self.submitted
                .lock()
                .unwrap()
                .push((product.product_id.clone(), quantity));
        }

        fn submit_restore(&self) {
            *self.restores.lock().unwrap() += 1;
        }
    }

    fn valid_product(id: &str, title: &str, price: f64) -> ProductInfo {
        ProductInfo {
            title: title.to_string(),
            price,
            valid: true,
            ..ProductInfo::placeholder(id)
        }
    }

    fn manager_over(backend: Arc<ScriptedBackend>) -> PurchaseManager {
        PurchaseManager::new(Arc::new(InlineDispatcher::new()), move |_sink| backend)
    }

    fn failure_log(manager: &PurchaseManager) -> Arc<Mutex<Vec<(String, i64)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        manager.events().purchase_failed.subscribe(move |e| {
            sink.lock().unwrap().push((e.message().to_string(), e.code()));
        });
        log
    }

    #[test]
    fn add_product_identifier_inserts_placeholder() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        manager.add_product_identifier("com.company.productone").unwrap();

        let products = manager.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, "com.company.productone");
        assert!(!products[0].valid);
        assert!(!manager.is_initialized());
    }

    #[test]
    fn add_product_identifier_is_idempotent() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        manager.add_product_identifier("p1").unwrap();
        manager.add_product_identifier("p1").unwrap();
        assert_eq!(manager.products().len(), 1);
    }

    #[test]
    fn add_product_identifier_rejects_blank_id() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        assert!(matches!(
            manager.add_product_identifier("   "),
            Err(IapError::InvalidArgument(_))
        ));
    }

    #[test]
    fn add_product_identifier_resets_initialization() {
        let backend = Arc::new(ScriptedBackend::resolved(
            vec![valid_product("p1", "Widget", 0.99)],
            vec![],
        ));
        let manager = manager_over(backend);
        manager.add_product_identifier("p1").unwrap();
        manager.initialize().unwrap();
        assert!(manager.is_initialized());

        manager.add_product_identifier("p2").unwrap();
        assert!(!manager.is_initialized());
    }

    #[test]
    fn request_product_information_rejects_empty_list() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        let err = manager
            .request_product_information(vec![], |_| {})
            .unwrap_err();
        assert!(matches!(err, IapError::InvalidArgument(_)));
    }

    #[test]
    fn request_product_information_delivers_once() {
        let backend = Arc::new(ScriptedBackend::resolved(
            vec![valid_product("p1", "Widget", 0.99)],
            vec!["p2"],
        ));
        let manager = manager_over(backend);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        manager
            .request_product_information(vec!["p1".into(), "p2".into()], move |result| {
                sink.lock().unwrap().push(result.unwrap());
            })
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].resolved.len(), 1);
        assert_eq!(seen[0].unresolved, vec!["p2".to_string()]);
        // The request path never mutates the registry.
        assert!(manager.products().is_empty());
    }

    #[test]
    fn cancelled_request_suppresses_completion() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = manager_over(backend.clone());

        let handle = manager
            .request_product_information(vec!["p1".into()], |_| {
                panic!("completion should have been suppressed")
            })
            .unwrap();
        handle.cancel();
        assert!(handle.is_cancelled());

        let parked = backend.parked.lock().unwrap().take().unwrap();
        parked(Ok(CatalogResponse::default()));
    }

    #[test]
    fn initialize_requires_registered_ids() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        assert!(matches!(
            manager.initialize(),
            Err(IapError::InvalidState(_))
        ));
    }

    #[test]
    fn initialize_upserts_resolved_and_sentinels() {
        let backend = Arc::new(ScriptedBackend::resolved(
            vec![valid_product("a", "Widget", 0.99)],
            vec!["b"],
        ));
        let manager = manager_over(backend);
        manager.add_product_identifier("a").unwrap();
        manager.add_product_identifier("b").unwrap();

        let initialized = Arc::new(Mutex::new(0));
        let hits = initialized.clone();
        manager.events().initialized.subscribe(move |_| {
            *hits.lock().unwrap() += 1;
        });

        manager.initialize().unwrap();

        assert!(manager.is_initialized());
        assert_eq!(*initialized.lock().unwrap(), 1);

        let mut products = manager.products();
        products.sort_by(|x, y| x.product_id.cmp(&y.product_id));
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Widget");
        assert!(products[0].valid);
        assert_eq!(products[1].title, "Invalid");
        assert!(!products[1].valid);
    }

    #[test]
    fn initialize_with_zero_resolved_ids_fails() {
        let backend = Arc::new(ScriptedBackend::resolved(vec![], vec!["a", "b"]));
        let manager = manager_over(backend);
        manager.add_product_identifier("a").unwrap();
        manager.add_product_identifier("b").unwrap();

        let failures = Arc::new(Mutex::new(0));
        let hits = failures.clone();
        manager.events().initialization_failed.subscribe(move |_| {
            *hits.lock().unwrap() += 1;
        });

        manager.initialize().unwrap();

        assert!(!manager.is_initialized());
        assert_eq!(*failures.lock().unwrap(), 1);
        // The sentinels are still upserted.
        assert_eq!(manager.products().len(), 2);
    }

    #[test]
    fn initialize_reports_fetch_failure() {
        let backend = Arc::new(ScriptedBackend::answering(Err(PurchaseError::new(
            "store unreachable",
            17,
        ))));
        let manager = manager_over(backend);
        manager.add_product_identifier("a").unwrap();

        let codes = Arc::new(Mutex::new(Vec::new()));
        let sink = codes.clone();
        manager.events().initialization_failed.subscribe(move |e| {
            sink.lock().unwrap().push(e.code());
        });

        manager.initialize().unwrap();
        assert!(!manager.is_initialized());
        assert_eq!(*codes.lock().unwrap(), vec![17]);
    }

    #[test]
    fn purchase_rejects_blank_id() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        assert!(matches!(
            manager.purchase_product(" "),
            Err(IapError::InvalidArgument(_))
        ));
    }

    #[test]
    fn purchase_unknown_id_fails_synchronously() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        let failures = failure_log(&manager);

        assert!(matches!(
            manager.purchase_product("unknown-id"),
            Err(IapError::InvalidState(_))
        ));
        // Never emits purchase_failed for this case.
        assert!(failures.lock().unwrap().is_empty());
    }

    #[test]
    fn purchase_rejects_zero_quantity() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        manager.add_product_identifier("p1").unwrap();
        assert!(matches!(
            manager.purchase_product_with_quantity("p1", 0),
            Err(IapError::InvalidArgument(_))
        ));
    }

    #[test]
    fn purchase_rejects_unsupported_platform() {
        let mut backend = ScriptedBackend::new();
        backend.supported = false;
        let manager = manager_over(Arc::new(backend));
        manager.add_product_identifier("p1").unwrap();
        assert!(matches!(
            manager.purchase_product("p1"),
            Err(IapError::Unsupported)
        ));
    }

    #[test]
    fn purchase_rejects_disabled_payments() {
        let mut backend = ScriptedBackend::new();
        backend.payments_enabled = false;
        let manager = manager_over(Arc::new(backend));
        manager.add_product_identifier("p1").unwrap();
        assert!(matches!(
            manager.purchase_product("p1"),
            Err(IapError::InvalidState(_))
        ));
    }

    #[test]
    fn purchase_before_initialize_emits_event_without_throwing() {
        let manager = manager_over(Arc::new(ScriptedBackend::new()));
        manager.add_product_identifier("p1").unwrap();
        let failures = failure_log(&manager);

        manager.purchase_product("p1").unwrap();

        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1, 0);
        assert!(failures[0].0.contains("not initialized"));
    }

    #[test]
    fn purchase_of_invalid_sentinel_emits_event() {
        let backend = Arc::new(ScriptedBackend::resolved(
            vec![valid_product("good", "Widget", 0.99)],
            vec!["bad"],
        ));
        let manager = manager_over(backend.clone());
        manager.add_product_identifier("good").unwrap();
        manager.add_product_identifier("bad").unwrap();
        manager.initialize().unwrap();
        let failures = failure_log(&manager);

        manager.purchase_product("bad").unwrap();

        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.contains("not valid"));
        assert!(backend.submitted.lock().unwrap().is_empty());
    }

    #[test]
    fn purchase_of_valid_product_submits_payment() {
        let backend = Arc::new(ScriptedBackend::resolved(
            vec![valid_product("p1", "Widget", 0.99)],
            vec![],
        ));
        let manager = manager_over(backend.clone());
        manager.add_product_identifier("p1").unwrap();
        manager.initialize().unwrap();

        manager.purchase_product_with_quantity("p1", 2).unwrap();

        assert_eq!(
            *backend.submitted.lock().unwrap(),
            vec![("p1".to_string(), 2)]
        );
    }

    #[test]
    fn restore_delegates_to_backend() {
        let backend = Arc::new(ScriptedBackend::new());
        let manager = manager_over(backend.clone());
        manager.restore_purchases();
        assert_eq!(*backend.restores.lock().unwrap(), 1);
    }

    #[test]
    fn sink_falls_back_to_placeholder_for_unknown_id() {
        let backend = Arc::new(ScriptedBackend::new());
        let sink_slot: Arc<Mutex<Option<EventSink>>> = Arc::new(Mutex::new(None));
        let slot = sink_slot.clone();
        let manager = PurchaseManager::new(Arc::new(InlineDispatcher::new()), move |sink| {
            *slot.lock().unwrap() = Some(sink);
            backend
        });

        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let log = outcomes.clone();
        manager.events().purchase_succeed.subscribe(move |o| {
            log.lock().unwrap().push((o.product.product_id.clone(), o.quantity));
        });

        let sink = sink_slot.lock().unwrap().clone().unwrap();
        sink.purchase_succeed("never-registered", 3);

        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![("never-registered".to_string(), 3)]
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Adding the same ids repeatedly never grows the registry
            /// past the number of distinct ids.
            #[test]
            fn add_is_idempotent(ids in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
                let manager = manager_over(Arc::new(ScriptedBackend::new()));
                for id in &ids {
                    manager.add_product_identifier(id).unwrap();
                }
                for id in &ids {
                    manager.add_product_identifier(id).unwrap();
                }

                let mut distinct = ids.clone();
                distinct.sort();
                distinct.dedup();
                prop_assert_eq!(manager.products().len(), distinct.len());
                prop_assert!(!manager.is_initialized());
            }
        }
    }
}
