//! Catalog product model.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque handle to the backend-native product object.
///
/// Store adapters attach the native catalog entry here when they resolve
/// a product, and extract it again when submitting a payment. The core
/// never looks inside; it only cares whether a handle is present.
#[derive(Clone)]
pub struct ProductHandle(Arc<dyn Any + Send + Sync>);

impl ProductHandle {
    pub fn new<T: Any + Send + Sync>(native: T) -> Self {
        Self(Arc::new(native))
    }

    /// Extract the native object, if it is of type `T`.
    ///
    /// Only the adapter that created the handle knows the right `T`.
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl core::fmt::Debug for ProductHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ProductHandle(..)")
    }
}

/// Catalog entry describing one purchasable product.
///
/// Produced by backend adapters when the store resolves a product id,
/// consumed by the manager and the application. Identity is
/// `product_id` (case-sensitive, caller-supplied).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub localized_price: String,
    pub is_downloadable: bool,
    pub download_content_version: String,
    /// False for placeholder and invalid-sentinel entries.
    pub valid: bool,
    /// Backend-native product object, attached by the resolving adapter.
    #[serde(skip)]
    pub handle: Option<ProductHandle>,
}

impl ProductInfo {
    /// Registry entry for an id that has not been resolved yet.
    pub fn placeholder(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            title: String::new(),
            description: String::new(),
            price: 0.0,
            localized_price: "0.00".to_string(),
            is_downloadable: false,
            download_content_version: String::new(),
            valid: false,
            handle: None,
        }
    }

    /// Sentinel for an id the store catalog rejected.
    pub fn invalid(product_id: impl Into<String>) -> Self {
        Self {
            title: "Invalid".to_string(),
            description: "Invalid Product".to_string(),
            ..Self::placeholder(product_id)
        }
    }

    pub fn with_handle(mut self, handle: ProductHandle) -> Self {
        self.handle = Some(handle);
        self
    }
}
