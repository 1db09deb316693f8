use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// 実行環境。開発環境ではエラーレスポンスに詳細を含める。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// SMTP 送信設定。`SMTP_HOST` が無い場合はログ出力のみのメーラーを使う。
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// `true` なら暗黙的 TLS (465番)、`false` なら STARTTLS
    pub secure: bool,
    pub username: String,
    pub password: String,
}

/// アプリケーション設定。
/// 起動時に環境変数 (`.env` を含む) から一度だけ読み込み、Rocket の State として共有します。
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// トークンの有効日数
    pub token_ttl_days: i64,
    /// 一致すれば登録時に admin 権限を与える招待トークン
    pub admin_invite_token: Option<String>,
    pub environment: Environment,
    /// アップロードファイルの保存先 (`tasks/` と `profiles/` を作成する)
    pub upload_dir: PathBuf,
    /// CORS で許可するオリジン
    pub allowed_origins: Vec<String>,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
}

impl AppConfig {
    pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

    /// 環境変数から設定を読み込みます。
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let token_ttl_days = match env::var("TOKEN_TTL_DAYS") {
            Ok(v) => v.parse().context("TOKEN_TTL_DAYS must be an integer")?,
            Err(_) => Self::DEFAULT_TOKEN_TTL_DAYS,
        };
        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(v) => v.parse().context("DB_MAX_CONNECTIONS must be an integer")?,
            Err(_) => 10,
        };

        let mut allowed_origins = vec![
            "http://localhost:5173".to_string(),
            "http://localhost:5174".to_string(),
        ];
        if let Ok(client_url) = env::var("CLIENT_URL") {
            if !client_url.is_empty() {
                allowed_origins.push(client_url);
            }
        }

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.is_empty() => Some(SmtpConfig {
                host,
                port: match env::var("SMTP_PORT") {
                    Ok(v) => v.parse().context("SMTP_PORT must be a port number")?,
                    Err(_) => 587,
                },
                secure: env::var("SMTP_SECURE").map(|v| v == "true").unwrap_or(false),
                username: env::var("SMTP_USER").unwrap_or_default(),
                password: env::var("SMTP_PASS").unwrap_or_default(),
            }),
            _ => None,
        };

        let mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| {
            let user = env::var("SMTP_USER").unwrap_or_default();
            let address = if user.is_empty() { "noreply@example.com".to_string() } else { user };
            format!("Progress Monitoring System <{}>", address)
        });

        Ok(Self {
            database_url,
            db_max_connections,
            jwt_secret,
            token_ttl_days,
            admin_invite_token: env::var("ADMIN_INVITE_TOKEN").ok().filter(|t| !t.is_empty()),
            environment: Environment::parse(&env::var("APP_ENV").unwrap_or_default()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/uploads")),
            allowed_origins,
            smtp,
            mail_from,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
