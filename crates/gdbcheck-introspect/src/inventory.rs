use gdbcheck_core::{Error, ListingFailure, LiveEntity, Result, StoreInventory};

use crate::adapter::Store;

/// Enumerate a store into an immutable inventory.
///
/// Only an enumeration failure is fatal (`StoreAccess`). An entity whose
/// fields cannot be listed is kept without fields and recorded as a listing
/// failure. Row counts are informational, so a failed count is logged and
/// left empty.
pub async fn build_inventory(store: &dyn Store) -> Result<StoreInventory> {
    tracing::info!(
        event = "inventory_started",
        engine = store.engine(),
        store = store.name()
    );

    let handles = store.list_entities().await.map_err(into_store_access)?;
    let mut entities = Vec::with_capacity(handles.len());
    let mut failures = Vec::new();

    for handle in handles {
        let fields = match store.list_fields(&handle).await {
            Ok(fields) => fields,
            Err(err) => {
                tracing::warn!(
                    event = "entity_listing_failed",
                    entity = %handle.name,
                    error = %err
                );
                failures.push(ListingFailure {
                    entity: handle.name.clone(),
                    message: err.to_string(),
                });
                Vec::new()
            }
        };

        let row_count = match store.row_count(&handle).await {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::warn!(
                    event = "row_count_failed",
                    entity = %handle.name,
                    error = %err
                );
                None
            }
        };

        tracing::debug!(
            event = "entity_listed",
            entity = %handle.name,
            dataset = handle.dataset.as_deref().unwrap_or(""),
            fields = fields.len()
        );

        entities.push(LiveEntity {
            name: handle.name,
            kind: handle.kind,
            dataset: handle.dataset,
            row_count,
            fields,
        });
    }

    let inventory = StoreInventory::new(store.engine(), store.name(), entities)
        .with_listing_failures(failures);
    tracing::info!(
        event = "inventory_finished",
        entities = inventory.entities.len(),
        listing_failures = inventory.listing_failures.len()
    );
    Ok(inventory)
}

fn into_store_access(err: Error) -> Error {
    match err {
        Error::StoreAccess(_) => err,
        other => Error::StoreAccess(other.to_string()),
    }
}
