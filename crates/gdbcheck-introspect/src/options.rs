/// Options that control how a PostgreSQL store is read.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    /// Schema holding standalone tables. Every other non-system schema is
    /// treated as a feature dataset.
    pub table_schema: String,
    /// Restrict feature datasets to these schemas.
    pub datasets: Option<Vec<String>>,
    /// Rows fetched per round trip while scanning.
    pub page_size: u32,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            table_schema: "public".to_string(),
            datasets: None,
            page_size: 5_000,
        }
    }
}
