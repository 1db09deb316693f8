#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalRequest};
use serde_json::{json, Value};
use task_tracker::build_rocket;
use task_tracker::config::{AppConfig, Environment};
use task_tracker::mailer::{Mailer, OutgoingMail};
use tempfile::TempDir;

pub const ADMIN_INVITE_TOKEN: &str = "invite-secret";
pub const PASSWORD: &str = "secret1";

/// 送信したメールを記録するだけのメーラー
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// テスト用のアプリケーション。
/// 一時ディレクトリに SQLite とアップロード先を作り、テストごとに使い捨てる。
pub struct TestApp {
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display()),
        db_max_connections: 5,
        jwt_secret: "integration-test-secret".to_string(),
        token_ttl_days: 7,
        admin_invite_token: Some(ADMIN_INVITE_TOKEN.to_string()),
        environment: Environment::Development,
        upload_dir: dir.path().join("uploads"),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        smtp: None,
        mail_from: "Task Tracker <noreply@example.com>".to_string(),
    }
}

pub async fn setup() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(&dir);
    let upload_dir = config.upload_dir.clone();

    let mailer = Arc::new(RecordingMailer::default());
    let rocket = build_rocket(config, mailer.clone()).await.expect("rocket instance");
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    TestApp { client, mailer, upload_dir, _dir: dir }
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

/// 登録済みユーザー
#[derive(Clone, Debug)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestApp {
    fn with_auth<'c>(request: LocalRequest<'c>, token: Option<&str>) -> LocalRequest<'c> {
        match token {
            Some(token) => request.header(bearer(token)),
            None => request,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (Status, Value) {
        let request = Self::with_auth(self.client.get(uri.to_string()), token);
        let response = request.dispatch().await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (Status, Value) {
        let request = Self::with_auth(self.client.delete(uri.to_string()), token);
        let response = request.dispatch().await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (Status, Value) {
        let request = self.client.post(uri.to_string()).header(ContentType::JSON).body(body.to_string());
        let response = Self::with_auth(request, token).dispatch().await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: Value) -> (Status, Value) {
        let request = self.client.put(uri.to_string()).header(ContentType::JSON).body(body.to_string());
        let response = Self::with_auth(request, token).dispatch().await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
    }

    /// multipart/form-data で1ファイルを送る
    pub async fn post_file(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> (Status, Value) {
        let boundary = "----task-tracker-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                field, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let response = self
            .client
            .post(uri.to_string())
            .header(Header::new("Content-Type", format!("multipart/form-data; boundary={}", boundary)))
            .header(bearer(token))
            .body(body)
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
    }

    async fn register_with(&self, body: Value) -> TestUser {
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let (status, json) = self.post_json("/api/auth/register", None, body).await;
        assert_eq!(status, Status::Created, "register failed: {}", json);
        TestUser {
            id: json["data"]["user"]["id"].as_i64().expect("user id"),
            email,
            token: json["token"].as_str().expect("token").to_string(),
        }
    }

    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        self.register_with(json!({ "name": name, "email": email, "password": PASSWORD }))
            .await
    }

    pub async fn register_admin(&self, name: &str, email: &str) -> TestUser {
        self.register_with(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "adminInviteToken": ADMIN_INVITE_TOKEN,
        }))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Status, Value) {
        self.post_json("/api/auth/login", None, json!({ "email": email, "password": password }))
            .await
    }

    /// タスクを作成し、レスポンスの `data` を返す
    pub async fn create_task(&self, token: &str, body: Value) -> Value {
        let (status, json) = self.post_json("/api/tasks", Some(token), body).await;
        assert_eq!(status, Status::Created, "create task failed: {}", json);
        json["data"].clone()
    }
}
