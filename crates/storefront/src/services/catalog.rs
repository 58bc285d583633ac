//! Product catalog reads with in-process caching.
//!
//! Listings and single products are cached for 5 minutes via `moka`, the
//! same way a headless storefront caches its upstream catalog. The admin
//! binary writes through a separate process, so edits become visible here
//! within one TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use larkspur_core::{ItemId, Product};
use larkspur_supabase::{Supabase, SupabaseError};

/// Cached value: either a listing or a single product.
#[derive(Clone)]
enum CacheValue {
    List(Arc<Vec<Product>>),
    One(Arc<Product>),
}

/// Read-side catalog client.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    client: Supabase,
    cache: Cache<String, CacheValue>,
}

impl Catalog {
    /// Create a new catalog over the given Supabase client.
    #[must_use]
    pub fn new(client: Supabase) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogInner { client, cache }),
        }
    }

    /// List products, newest first, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails on a cache miss.
    #[instrument(skip(self))]
    pub async fn list(&self, category: Option<&str>) -> Result<Arc<Vec<Product>>, SupabaseError> {
        let cache_key = category.map_or_else(
            || "products:all".to_string(),
            |c| format!("products:category:{c}"),
        );

        if let Some(CacheValue::List(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let mut query = self
            .inner
            .client
            .table("products")
            .select("*")
            .order("created_at", true);
        if let Some(category) = category {
            query = query.eq("category", category);
        }

        let products: Arc<Vec<Product>> = Arc::new(query.fetch().await?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::List(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no such product exists.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ItemId) -> Result<Arc<Product>, SupabaseError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::One(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Arc<Product> = Arc::new(
            self.inner
                .client
                .table("products")
                .select("*")
                .eq("id", id)
                .single()
                .await?,
        );

        self.inner
            .cache
            .insert(cache_key, CacheValue::One(Arc::clone(&product)))
            .await;

        Ok(product)
    }
}
