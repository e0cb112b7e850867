//! `iapbridge-store` — the generic store backend adapter.
//!
//! [`StoreService`] is the boundary to a native store SDK (payment
//! queue, catalog query, transaction observer registration).
//! [`StoreAdapter`] implements the manager's `StoreBackend` contract
//! over any such service, and [`TransactionObserver`] turns the
//! service's asynchronous transaction notices into lifecycle events.

pub mod adapter;
pub mod observer;
pub mod service;

pub use adapter::StoreAdapter;
pub use observer::TransactionObserver;
pub use service::{
    NoticeCallback, ObserverHandle, Payment, QueryCallback, StoreCatalog, StoreProduct,
    StoreService, Transaction, TransactionFault, TransactionNotice, TransactionRef,
    TransactionState,
};
