//! Table (PostgREST) API client.
//!
//! A small builder over the REST surface the application actually uses:
//! filtered reads, inserts, filtered updates, and filtered deletes. Requests
//! run with the anon key by default; pass a user token via [`TableRequest::auth`]
//! so row-level security applies, or escalate with
//! [`TableRequest::service_role`] for catalog management.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{ClientInner, SupabaseError};

/// Entry point for a request against one table.
pub struct TableRequest {
    inner: Arc<ClientInner>,
    table: String,
    token: Option<String>,
}

impl TableRequest {
    pub(crate) fn new(inner: Arc<ClientInner>, table: &str) -> Self {
        Self {
            inner,
            table: table.to_string(),
            token: None,
        }
    }

    /// Run this request as a signed-in user (row-level security applies).
    #[must_use]
    pub fn auth(mut self, access_token: &str) -> Self {
        self.token = Some(access_token.to_string());
        self
    }

    /// Run this request with the service-role key, bypassing row-level
    /// security.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingServiceKey`] if the client was
    /// configured without one.
    pub fn service_role(mut self) -> Result<Self, SupabaseError> {
        let token = self
            .inner
            .config
            .service_role_token()
            .ok_or(SupabaseError::MissingServiceKey)?;
        self.token = Some(token);
        Ok(self)
    }

    /// Start a filtered read of the given columns (`*` for all).
    #[must_use]
    pub fn select(self, columns: &str) -> SelectBuilder {
        SelectBuilder {
            columns: columns.to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            request: self,
        }
    }

    /// Insert rows, discarding the created representation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the request fails.
    #[instrument(skip(self, rows), fields(table = %self.table))]
    pub async fn insert<T: Serialize + ?Sized>(self, rows: &T) -> Result<(), SupabaseError> {
        let request = self
            .inner
            .authed(self.inner.http.post(self.url()), self.token.as_deref())
            .header("Prefer", "return=minimal")
            .json(rows);

        self.inner.execute(request).await?;
        Ok(())
    }

    /// Insert rows and return the created rows, backend-assigned columns
    /// included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the request, or response
    /// deserialization fails.
    #[instrument(skip(self, rows), fields(table = %self.table))]
    pub async fn insert_returning<T, R>(self, rows: &T) -> Result<Vec<R>, SupabaseError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .inner
            .authed(self.inner.http.post(self.url()), self.token.as_deref())
            .header("Prefer", "return=representation")
            .json(rows);

        let body = self.inner.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Start a filtered update with the given patch.
    #[must_use]
    pub fn update<T: Serialize>(self, patch: &T) -> UpdateBuilder {
        UpdateBuilder {
            patch: serde_json::to_value(patch),
            filters: Vec::new(),
            request: self,
        }
    }

    /// Start a filtered delete.
    #[must_use]
    pub fn delete(self) -> DeleteBuilder {
        DeleteBuilder {
            filters: Vec::new(),
            request: self,
        }
    }

    fn url(&self) -> String {
        format!("{}/{}", self.inner.config.rest_url(), self.table)
    }
}

/// Builder for filtered reads.
pub struct SelectBuilder {
    request: TableRequest,
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<u32>,
}

impl SelectBuilder {
    /// Keep rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Order results by `column`.
    #[must_use]
    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.order = Some(format!("{column}.{direction}"));
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fetch all matching rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row does not match the
    /// expected record shape.
    #[instrument(skip(self), fields(table = %self.request.table))]
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, SupabaseError> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), self.columns)];
        params.extend(self.filters);
        if let Some(order) = self.order {
            params.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let inner = Arc::clone(&self.request.inner);
        let request = inner
            .authed(
                inner.http.get(self.request.url()).query(&params),
                self.request.token.as_deref(),
            );

        let body = inner.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch at most one matching row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the row does not match the
    /// expected record shape.
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, SupabaseError> {
        let table = self.request.table.clone();
        let mut rows: Vec<T> = self.limit(2).fetch().await?;
        if rows.len() > 1 {
            tracing::warn!(table = %table, "expected at most one row, got several");
        }
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    /// Fetch exactly one matching row.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no row matches.
    pub async fn single<T: DeserializeOwned>(self) -> Result<T, SupabaseError> {
        let table = self.request.table.clone();
        self.maybe_single()
            .await?
            .ok_or_else(|| SupabaseError::NotFound(format!("no matching row in {table}")))
    }
}

/// Builder for filtered updates.
pub struct UpdateBuilder {
    request: TableRequest,
    patch: Result<serde_json::Value, serde_json::Error>,
    filters: Vec<(String, String)>,
}

impl UpdateBuilder {
    /// Restrict the update to rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Apply the patch.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch cannot be serialized or the request
    /// fails.
    #[instrument(skip(self), fields(table = %self.request.table))]
    pub async fn execute(self) -> Result<(), SupabaseError> {
        let patch = self.patch?;

        let inner = Arc::clone(&self.request.inner);
        let request = inner
            .authed(
                inner
                    .http
                    .patch(self.request.url())
                    .query(&self.filters),
                self.request.token.as_deref(),
            )
            .header("Prefer", "return=minimal")
            .json(&patch);

        inner.execute(request).await?;
        Ok(())
    }
}

/// Builder for filtered deletes.
pub struct DeleteBuilder {
    request: TableRequest,
    filters: Vec<(String, String)>,
}

impl DeleteBuilder {
    /// Restrict the delete to rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Execute the delete. With no filters this removes every row the
    /// caller's token can see; only the CLI's catalog reset does that.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(table = %self.request.table))]
    pub async fn execute(self) -> Result<(), SupabaseError> {
        let inner = Arc::clone(&self.request.inner);
        let request = inner.authed(
            inner
                .http
                .delete(self.request.url())
                .query(&self.filters),
            self.request.token.as_deref(),
        );

        inner.execute(request).await?;
        Ok(())
    }
}
