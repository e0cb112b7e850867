//! Transaction queue observer.
//!
//! One observer instance is shared across all purchase and restore
//! calls for an adapter's lifetime. It receives asynchronous
//! transaction-state notices from the store, acknowledges terminal
//! transactions, and feeds the outcomes into the manager's events.

use std::sync::Arc;

use tracing::{debug, warn};

use iapbridge_core::PurchaseError;
use iapbridge_manager::EventSink;

use crate::service::{
    StoreService, Transaction, TransactionFault, TransactionNotice, TransactionState,
};

/// Routes store transaction notices into lifecycle events.
pub struct TransactionObserver<S: StoreService> {
    service: Arc<S>,
    sink: EventSink,
}

impl<S: StoreService> TransactionObserver<S> {
    pub fn new(service: Arc<S>, sink: EventSink) -> Self {
        Self { service, sink }
    }

    /// Process one notice. Batches are processed in delivery order;
    /// individual transactions are never reordered.
    pub fn handle_notice(&self, notice: TransactionNotice) {
        match notice {
            TransactionNotice::Updated(batch) => {
                for transaction in batch {
                    self.handle_transaction(transaction);
                }
            }
            TransactionNotice::RestoreCompleted => self.sink.restore_succeed(),
            TransactionNotice::RestoreFailed(error) => self.sink.restore_failed(error),
        }
    }

    fn handle_transaction(&self, transaction: Transaction) {
        match transaction.state {
            TransactionState::Purchased | TransactionState::Restored => {
                self.complete(transaction)
            }
            TransactionState::Failed => self.fail(transaction),
            // Not yet terminal; the store will notify again.
            TransactionState::Pending | TransactionState::Deferred => {}
        }
    }

    fn complete(&self, transaction: Transaction) {
        // Acknowledge before notifying. An unfinished transaction is
        // replayed by the store on next launch.
        self.service.finish_transaction(transaction.reference);

        // A restored renewal-style transaction wraps the purchase it
        // re-delivers; report the original payment, not the wrapper's.
        let payment = transaction
            .original
            .as_deref()
            .map(|original| &original.payment)
            .unwrap_or(&transaction.payment);

        debug!(
            reference = %transaction.reference,
            product_id = %payment.product_id,
            quantity = payment.quantity,
            "transaction resolved"
        );
        self.sink
            .purchase_succeed(&payment.product_id, payment.quantity);
    }

    fn fail(&self, transaction: Transaction) {
        let fault = transaction.fault.unwrap_or(TransactionFault {
            code: PurchaseError::UNKNOWN_CODE,
            message: "unknown transaction failure".to_string(),
        });

        let error = if fault.code == self.service.user_cancelled_code() {
            PurchaseError::cancelled("payment was cancelled", fault.code)
        } else {
            PurchaseError::new(fault.message, fault.code)
        };

        warn!(reference = %transaction.reference, code = fault.code, "transaction failed");
        self.service.finish_transaction(transaction.reference);
        self.sink.purchase_failed(error);
    }
}
