use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use gdbcheck_core::{EntityHandle, Error, LiveField, Result};

use crate::adapter::{RowStream, Store};
use crate::options::PostgresOptions;

mod mapper;
mod queries;

/// Store backed by a PostgreSQL/PostGIS database.
///
/// Tables in [`PostgresOptions::table_schema`] are standalone entities; every
/// other schema is a feature dataset.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    database: String,
    opts: PostgresOptions,
}

impl PostgresStore {
    /// Create a store using a pre-configured pool.
    pub async fn new(pool: PgPool, opts: PostgresOptions) -> Result<Self> {
        let database = queries::fetch_database_name(&pool).await?;
        Ok(Self {
            pool,
            database,
            opts,
        })
    }

    /// Connect to the database at `url`.
    pub async fn connect(url: &str, opts: PostgresOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|err| Error::StoreAccess(err.to_string()))?;
        Self::new(pool, opts).await
    }

    fn schema_of<'a>(&'a self, entity: &'a EntityHandle) -> &'a str {
        entity.dataset.as_deref().unwrap_or(&self.opts.table_schema)
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    fn name(&self) -> &str {
        &self.database
    }

    async fn list_entities(&self) -> Result<Vec<EntityHandle>> {
        let relations = queries::list_relations(&self.pool).await?;
        let geometry = queries::list_geometry_columns(&self.pool).await;
        Ok(mapper::map_relations(relations, geometry, &self.opts))
    }

    async fn list_fields(&self, entity: &EntityHandle) -> Result<Vec<LiveField>> {
        let raw = queries::list_columns(&self.pool, self.schema_of(entity), &entity.name).await?;
        Ok(mapper::map_columns(raw))
    }

    async fn row_count(&self, entity: &EntityHandle) -> Result<u64> {
        queries::count_rows(&self.pool, self.schema_of(entity), &entity.name).await
    }

    fn scan_rows<'a>(&'a self, entity: &'a EntityHandle, fields: &'a [String]) -> RowStream<'a> {
        if fields.is_empty() {
            return stream::empty().boxed();
        }

        let statement = queries::scan_statement(self.schema_of(entity), &entity.name, fields);
        let page_size = i64::from(self.opts.page_size.max(1));

        stream::try_unfold(Some(0_i64), move |offset| {
            let statement = statement.clone();
            async move {
                let Some(offset) = offset else {
                    return Ok(None);
                };
                let page =
                    queries::fetch_page(&self.pool, &statement, &entity.name, page_size, offset)
                        .await?;
                let next = (page.len() as i64 == page_size).then_some(offset + page_size);
                let rows = stream::iter(page.into_iter().map(Ok::<_, Error>));
                Ok::<_, Error>(Some((rows, next)))
            }
        })
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_a_store_access_error() {
        let result =
            PostgresStore::connect("postgres://geo@db:notaport/quad", PostgresOptions::default())
                .await;
        assert!(matches!(result, Err(Error::StoreAccess(_))));
    }
}
