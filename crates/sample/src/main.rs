//! Demo: the full purchase lifecycle over the in-memory store.
//!
//! Run with `RUST_LOG=debug` to watch the transaction queue.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use iapbridge_events::InlineDispatcher;
use iapbridge_manager::PurchaseManager;
use iapbridge_memstore::MemoryStore;
use iapbridge_store::StoreAdapter;

const PRODUCT_ONE: &str = "com.company.productone";
const PRODUCT_TWO: &str = "com.company.producttwo";

fn main() -> Result<()> {
    iapbridge_observability::init();

    let store = Arc::new(
        MemoryStore::new()
            .with_priced_product(PRODUCT_ONE, "Product One", 0.99)
            .with_priced_product(PRODUCT_TWO, "Product Two", 4.99),
    );

    let manager = {
        let store = store.clone();
        PurchaseManager::new(Arc::new(InlineDispatcher::new()), move |sink| {
            StoreAdapter::new(store, sink)
        })
    };

    manager.events().initialized.subscribe(|_| {
        info!("catalog initialized");
    });
    manager.events().purchase_succeed.subscribe(|outcome| {
        info!(
            product = %outcome.product.product_id,
            title = %outcome.product.title,
            quantity = outcome.quantity,
            "purchase succeeded"
        );
    });
    manager.events().purchase_failed.subscribe(|error| {
        info!(code = error.code(), "purchase failed: {}", error.message());
    });
    manager.events().restore_succeed.subscribe(|_| {
        info!("restore finished");
    });

    manager.add_product_identifier(PRODUCT_ONE)?;
    manager.add_product_identifier(PRODUCT_TWO)?;
    manager.initialize()?;

    for product in manager.products() {
        info!(
            id = %product.product_id,
            title = %product.title,
            price = %product.localized_price,
            valid = product.valid,
            "catalog entry"
        );
    }

    manager.purchase_product_with_quantity(PRODUCT_ONE, 2)?;
    store.settle_all();

    manager.purchase_product(PRODUCT_TWO)?;
    store.fail_next(2, "changed my mind");

    manager.restore_purchases();
    store.complete_restore();

    Ok(())
}
