// Service-level error types.

use thiserror::Error;

/// Errors surfaced by the ladder service layer. The rating fold itself
/// cannot fail; everything fallible lives at the data-source boundary.
#[derive(Debug, Error)]
pub enum LadderError {
    #[error("data source error: {0}")]
    DataSource(#[from] sqlx::Error),
}
