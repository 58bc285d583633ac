//! Storage API client.
//!
//! Uploads go through the service-role key; the public storefront never
//! writes objects, it only renders the public URLs stored on catalog rows.

use std::sync::Arc;

use tracing::instrument;

use crate::{ClientInner, SupabaseError};

/// Client for the storage API (`/storage/v1`).
#[derive(Clone)]
pub struct StorageClient {
    inner: Arc<ClientInner>,
}

impl StorageClient {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Upload an object into a bucket, replacing any existing object at the
    /// same path.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingServiceKey`] if no service-role key
    /// is configured, or another variant if the upload fails.
    #[instrument(skip(self, bytes), fields(bucket = %bucket, path = %path, size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SupabaseError> {
        let token = self
            .inner
            .config
            .service_role_token()
            .ok_or(SupabaseError::MissingServiceKey)?;

        let url = format!("{}/object/{bucket}/{path}", self.inner.config.storage_url());
        let request = self
            .inner
            .authed(self.inner.http.post(&url), Some(&token))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes);

        self.inner.execute(request).await?;
        Ok(())
    }

    /// Public URL of an object in a public bucket.
    ///
    /// Purely string construction; no request is made and existence is not
    /// checked.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/object/public/{bucket}/{path}",
            self.inner.config.storage_url()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Supabase, SupabaseConfig};

    #[test]
    fn test_public_url_shape() {
        let client = Supabase::new(SupabaseConfig {
            project_url: "https://abc123.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: None,
        });

        assert_eq!(
            client.storage().public_url("product-images", "mug.jpg"),
            "https://abc123.supabase.co/storage/v1/object/public/product-images/mug.jpg"
        );
    }
}
