use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};

/// リクエストごとのアクセスログを出力する Fairing。
/// Djangoのミドルウェアに相当し、全リクエストの前後に処理を挟みます。
pub struct RequestLogger;

#[derive(Clone, Copy)]
struct StartedAt(Option<Instant>);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _data: &mut Data<'_>) {
        request.local_cache(|| StartedAt(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed_ms = request
            .local_cache(|| StartedAt(None))
            .0
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or_default();
        let status = response.status();

        if status.code >= 500 {
            tracing::error!(method = %request.method(), path = %request.uri().path(), status = status.code, elapsed_ms, "request");
        } else {
            tracing::info!(method = %request.method(), path = %request.uri().path(), status = status.code, elapsed_ms, "request");
        }
    }
}
