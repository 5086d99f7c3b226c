use art_heaven_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    migration::Migrator,
};
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;

    let pending = Migrator::get_pending_migrations(&orm).await?.len();
    run_migrations(&orm).await?;
    tracing::info!(applied = pending, "migrations up to date");
    Ok(())
}
