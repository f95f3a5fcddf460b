use sqlx::PgPool;
use sqlx::Row as _;
use sqlx::postgres::PgRow;

use gdbcheck_core::{Error, FieldValue, Result, Row};

use super::mapper::quote_ident;

pub async fn fetch_database_name(pool: &PgPool) -> Result<String> {
    sqlx::query_scalar::<_, String>("select current_database()")
        .fetch_one(pool)
        .await
        .map_err(|err| Error::StoreAccess(err.to_string()))
}

pub struct RawRelation {
    pub schema: String,
    pub name: String,
}

pub async fn list_relations(pool: &PgPool) -> Result<Vec<RawRelation>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"
        select n.nspname::text, c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where c.relkind in ('r','p','v','m','f')
          and n.nspname not like 'pg\_%'
          and n.nspname not in ('information_schema', 'topology', 'tiger')
        order by n.nspname, c.relname
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|err| Error::StoreAccess(err.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|(schema, name)| RawRelation { schema, name })
        .collect())
}

pub struct RawGeometryColumn {
    pub schema: String,
    pub table: String,
    pub geometry_type: String,
}

/// Geometry columns registered with PostGIS. Empty when PostGIS is absent.
pub async fn list_geometry_columns(pool: &PgPool) -> Vec<RawGeometryColumn> {
    let result = sqlx::query_as::<_, (String, String, String)>(
        r#"
        select f_table_schema::text, f_table_name::text, type::text
        from geometry_columns
        "#,
    )
    .fetch_all(pool)
    .await;

    match result {
        Ok(rows) => rows
            .into_iter()
            .map(|(schema, table, geometry_type)| RawGeometryColumn {
                schema,
                table,
                geometry_type,
            })
            .collect(),
        Err(err) => {
            tracing::warn!(event = "geometry_columns_unavailable", error = %err);
            Vec::new()
        }
    }
}

pub struct RawColumn {
    pub name: String,
    pub udt_name: String,
    pub is_nullable: bool,
    pub character_max_length: Option<i32>,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (String, String, String, Option<i32>)>(
        r#"
        select
          column_name::text,
          udt_name::text,
          is_nullable::text,
          character_maximum_length::int4
        from information_schema.columns
        where table_schema = $1
          and table_name = $2
        order by ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::entity_read(table, err.to_string()))?;

    Ok(rows
        .into_iter()
        .map(
            |(name, udt_name, is_nullable, character_max_length)| RawColumn {
                name,
                udt_name,
                is_nullable: is_nullable == "YES",
                character_max_length,
            },
        )
        .collect())
}

pub async fn count_rows(pool: &PgPool, schema: &str, table: &str) -> Result<u64> {
    let sql = format!(
        "select count(*) from {}.{}",
        quote_ident(schema),
        quote_ident(table)
    );
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .map_err(|err| Error::entity_read(table, err.to_string()))?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Select statement returning every requested field as text, without paging.
pub fn scan_statement(schema: &str, table: &str, fields: &[String]) -> String {
    let columns: Vec<String> = fields
        .iter()
        .map(|field| format!("{}::text", quote_ident(field)))
        .collect();
    let ordering: Vec<String> = (1..=fields.len()).map(|pos| pos.to_string()).collect();
    format!(
        "select {} from {}.{} order by {}",
        columns.join(", "),
        quote_ident(schema),
        quote_ident(table),
        ordering.join(", ")
    )
}

pub async fn fetch_page(
    pool: &PgPool,
    statement: &str,
    table: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Row>> {
    let sql = format!("{statement} limit {limit} offset {offset}");
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::entity_read(table, err.to_string()))?;

    rows.iter().map(|row| decode_row(row, table)).collect()
}

fn decode_row(row: &PgRow, table: &str) -> Result<Row> {
    (0..row.len())
        .map(|index| {
            row.try_get::<Option<String>, _>(index)
                .map(|value| value.map_or(FieldValue::Null, FieldValue::Text))
                .map_err(|err| Error::entity_read(table, err.to_string()))
        })
        .collect()
}
