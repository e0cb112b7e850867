//! `iapbridge-core` — domain foundation for the in-app-purchase facade.
//!
//! This crate contains **pure domain** types (no store SDKs, no IO): the
//! catalog product model and the unified error taxonomy shared by the
//! manager and every store backend.

pub mod error;
pub mod product;

pub use error::{IapError, IapResult, PurchaseError, PurchaseErrorKind};
pub use product::{ProductHandle, ProductInfo};
