use std::env;
use std::path::PathBuf;

use gdbcheck_core::ncgmp09_registry;
use gdbcheck_eval::{render_report, validate};
use gdbcheck_introspect::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: validate_fixture <store.json>")?;

    let store = MemoryStore::from_path(&path)?;
    let report = validate(&store, &ncgmp09_registry()).await?;
    print!("{}", render_report(&report));
    Ok(())
}
