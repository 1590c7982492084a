//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and creates the session table.
//! Migrations never run when the storefront starts.

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    devgon_storefront::db::migrate(&pool).await?;
    tracing::info!("Storefront migrations complete!");
    Ok(())
}
