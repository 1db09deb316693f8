use task_tracker::config::AppConfig;
use tracing_subscriber::EnvFilter;

/// アプリケーションのメインエントリーポイント。
/// Djangoの `manage.py runserver` 実行時の動きに相当します。
#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,rocket=warn")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let mailer = task_tracker::mailer_from_config(&config)?;

    let _rocket = task_tracker::build_rocket(config, mailer).await?.launch().await?;
    Ok(())
}
