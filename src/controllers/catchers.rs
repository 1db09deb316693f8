use rocket::http::Status;
use rocket::serde::json::{Json, Value};
use rocket::{Catcher, Request};

use crate::errors::{error_body, is_development};
use crate::guards::auth::GuardFailure;

// ガードが記録した理由があればそれを使う
fn message(request: &Request<'_>, fallback: &str) -> String {
    request
        .local_cache(GuardFailure::default)
        .0
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

#[catch(400)]
fn bad_request(request: &Request<'_>) -> Json<Value> {
    Json(error_body(&message(request, "Bad request"), None))
}

#[catch(401)]
fn unauthorized(request: &Request<'_>) -> Json<Value> {
    Json(error_body(&message(request, "Not authorized to access this route"), None))
}

#[catch(403)]
fn forbidden(request: &Request<'_>) -> Json<Value> {
    Json(error_body(&message(request, "Forbidden"), None))
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(error_body("Not Found", None))
}

#[catch(413)]
fn payload_too_large() -> Json<Value> {
    Json(error_body("File too large. Maximum size is 10MB", None))
}

/// 本文の JSON が読めない場合も入力エラーとして 400 を返す
#[catch(422)]
fn unprocessable(request: &Request<'_>) -> (Status, Json<Value>) {
    let detail = is_development(request).then(|| "Request body could not be parsed".to_string());
    (Status::BadRequest, Json(error_body("Invalid request body", detail)))
}

#[catch(500)]
fn internal_error() -> Json<Value> {
    Json(error_body("Something went wrong!", None))
}

#[catch(default)]
fn default_catcher(status: Status, _request: &Request<'_>) -> Json<Value> {
    Json(error_body(status.reason().unwrap_or("Unknown error"), None))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        payload_too_large,
        unprocessable,
        internal_error,
        default_catcher,
    ]
}
