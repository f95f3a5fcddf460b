use anyhow::{Context, Result};
use futures::TryStreamExt;
use gdbcheck_core::{EntityKind, FieldType, FieldValue, Row};
use gdbcheck_introspect::{PostgresOptions, PostgresStore, Store, build_inventory};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;

const FIXTURE: &[&str] = &[
    r#"drop schema if exists "GeologicMap" cascade"#,
    r#"drop table if exists public."DataSources""#,
    r#"create schema "GeologicMap""#,
    r#"create table public."DataSources" (
        "DataSources_ID" varchar(50) not null,
        "Source" varchar(255) not null,
        "Notes" text
    )"#,
    r#"insert into public."DataSources" values ('DAS1', 'Field work', null), ('DAS2', 'Compilation ', 'n')"#,
    r#"create table "GeologicMap"."MapUnitPolys" (
        "MapUnitPolys_ID" varchar(50) not null,
        "MapUnit" varchar(10) not null
    )"#,
    r#"insert into "GeologicMap"."MapUnitPolys" values ('MUP1', 'Qal')"#,
];

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL").ok()
}

async fn reset_fixture(pool: &PgPool) -> Result<()> {
    for statement in FIXTURE {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("executing {statement}"))?;
    }
    Ok(())
}

#[tokio::test]
async fn reads_tables_datasets_and_rows() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return Ok(());
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&db_url)
        .await
        .context("connecting to Postgres")?;
    reset_fixture(&pool).await?;

    let store = PostgresStore::new(
        pool,
        PostgresOptions {
            page_size: 1,
            ..PostgresOptions::default()
        },
    )
    .await?;
    let inventory = build_inventory(&store).await?;

    let sources = inventory
        .entity("DataSources")
        .context("expected DataSources")?;
    assert_eq!(sources.kind, EntityKind::Table);
    assert_eq!(sources.dataset, None);
    assert_eq!(sources.row_count, Some(2));
    let id = sources.field("DataSources_ID").context("expected id field")?;
    assert_eq!(id.field_type, FieldType::Text);
    assert_eq!(id.length, Some(50));
    assert!(!id.nullable);

    let polys = inventory
        .entity("MapUnitPolys")
        .context("expected MapUnitPolys")?;
    assert_eq!(polys.dataset.as_deref(), Some("GeologicMap"));

    let fields = vec!["DataSources_ID".to_string(), "Source".to_string()];
    let rows: Vec<Row> = store
        .scan_rows(&sources.handle(), &fields)
        .try_collect()
        .await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], FieldValue::Text("Field work".to_string()));
    assert_eq!(rows[1][1], FieldValue::Text("Compilation ".to_string()));

    Ok(())
}
