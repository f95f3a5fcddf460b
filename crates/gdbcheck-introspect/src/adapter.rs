use async_trait::async_trait;
use futures::stream::BoxStream;

use gdbcheck_core::{EntityHandle, LiveField, Result, Row};

/// Lazy sequence of rows. Each call to [`Store::scan_rows`] starts a fresh scan.
pub type RowStream<'a> = BoxStream<'a, Result<Row>>;

/// Read-only access to a geospatial store.
///
/// Implementations never mutate the store. Enumeration failures should be
/// reported as `Error::StoreAccess`; failures reading a single entity as
/// `Error::EntityRead`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Store name shown in reports.
    fn name(&self) -> &str;

    /// Enumerate every table and feature class, including dataset members.
    async fn list_entities(&self) -> Result<Vec<EntityHandle>>;

    /// Field metadata of one entity, in storage order.
    async fn list_fields(&self, entity: &EntityHandle) -> Result<Vec<LiveField>>;

    async fn row_count(&self, entity: &EntityHandle) -> Result<u64>;

    /// Stream rows projected onto `fields`, in the given order.
    fn scan_rows<'a>(&'a self, entity: &'a EntityHandle, fields: &'a [String]) -> RowStream<'a>;
}
