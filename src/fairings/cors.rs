use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response};

/// 許可されたオリジンにだけ CORS ヘッダーを付ける Fairing。
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let Some(origin) = request.headers().get_one("Origin") else {
            return;
        };
        if !self.allows(origin) {
            return;
        }

        response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, PATCH, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type, Authorization"));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

/// プリフライトリクエスト (OPTIONS) への応答。ヘッダーは `Cors` が付ける。
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_only_listed_origins() {
        let cors = Cors::new(vec!["http://localhost:5173".into()]);
        assert!(cors.allows("http://localhost:5173"));
        assert!(!cors.allows("http://evil.example.com"));
        assert!(!cors.allows("http://localhost:5173/"));
    }
}
