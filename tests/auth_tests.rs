use rocket::http::Status;
use serde_json::json;

mod common;

#[rocket::async_test]
async fn test_register_returns_token_and_public_user() {
    let app = common::setup().await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({ "name": "Alice", "email": "Alice@Example.com", "password": "secret1" }),
        )
        .await;

    assert_eq!(status, Status::Created);
    assert_eq!(body["success"], true);
    assert!(!body["token"].as_str().unwrap().is_empty());

    let user = &body["data"]["user"];
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["role"], "member");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("tokenVersion").is_none());
}

#[rocket::async_test]
async fn test_duplicate_email_is_case_insensitive() {
    let app = common::setup().await;
    let alice = app.register("Alice", "alice@example.com").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({ "name": "Impostor", "email": "ALICE@example.COM", "password": "another1" }),
        )
        .await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists with this email");

    // 最初のユーザーはそのまま
    let (status, body) = app.login("alice@example.com", common::PASSWORD).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["user"]["name"], "Alice");
    assert_eq!(body["data"]["user"]["id"], alice.id);
}

#[rocket::async_test]
async fn test_admin_invite_token_grants_admin_role() {
    let app = common::setup().await;

    let (_, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "name": "Root",
                "email": "root@example.com",
                "password": "secret1",
                "adminInviteToken": common::ADMIN_INVITE_TOKEN,
            }),
        )
        .await;
    assert_eq!(body["data"]["user"]["role"], "admin");

    let (_, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "name": "Guess",
                "email": "guess@example.com",
                "password": "secret1",
                "adminInviteToken": "wrong",
            }),
        )
        .await;
    assert_eq!(body["data"]["user"]["role"], "member");
}

#[rocket::async_test]
async fn test_register_validation() {
    let app = common::setup().await;

    let (status, body) = app
        .post_json("/api/auth/register", None, json!({ "email": "x@example.com" }))
        .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["message"], "Please provide name, email and password");

    let (status, _) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({ "name": "Short", "email": "short@example.com", "password": "123" }),
        )
        .await;
    assert_eq!(status, Status::BadRequest);

    let (status, _) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({ "name": "Bad", "email": "not-an-email", "password": "secret1" }),
        )
        .await;
    assert_eq!(status, Status::BadRequest);
}

#[rocket::async_test]
async fn test_login_failures_are_indistinguishable() {
    let app = common::setup().await;
    app.register("Alice", "alice@example.com").await;

    let (wrong_password_status, wrong_password) = app.login("alice@example.com", "nope-nope").await;
    let (unknown_email_status, unknown_email) = app.login("nobody@example.com", "nope-nope").await;

    assert_eq!(wrong_password_status, Status::Unauthorized);
    assert_eq!(unknown_email_status, Status::Unauthorized);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["message"], "Incorrect email or password");

    let (status, body) = app.login("ALICE@example.com", common::PASSWORD).await;
    assert_eq!(status, Status::Ok);
    assert!(body["data"]["user"]["lastLogin"].is_string());
}

#[rocket::async_test]
async fn test_profile_requires_valid_token() {
    let app = common::setup().await;
    let alice = app.register("Alice", "alice@example.com").await;

    let (status, body) = app.get("/api/auth/profile", None).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, body) = app.get("/api/auth/profile", Some("garbage")).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body["message"], "Not authorized to access this route");

    let (status, body) = app.get("/api/auth/profile", Some(&alice.token)).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["email"], "alice@example.com");
}

#[rocket::async_test]
async fn test_update_profile_rejects_taken_email() {
    let app = common::setup().await;
    let alice = app.register("Alice", "alice@example.com").await;
    app.register("Bob", "bob@example.com").await;

    let (status, _) = app
        .put_json("/api/auth/profile", Some(&alice.token), json!({ "email": "BOB@example.com" }))
        .await;
    assert_eq!(status, Status::Conflict);

    let (status, body) = app
        .put_json("/api/auth/profile", Some(&alice.token), json!({ "name": "Alice Liddell" }))
        .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["user"]["name"], "Alice Liddell");
}

#[rocket::async_test]
async fn test_password_change_revokes_old_tokens() {
    let app = common::setup().await;
    let alice = app.register("Alice", "alice@example.com").await;

    let (status, body) = app
        .put_json(
            "/api/auth/update-password",
            Some(&alice.token),
            json!({ "currentPassword": "wrong-one", "newPassword": "secret2" }),
        )
        .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, body) = app
        .put_json(
            "/api/auth/update-password",
            Some(&alice.token),
            json!({ "currentPassword": common::PASSWORD, "newPassword": "secret2" }),
        )
        .await;
    assert_eq!(status, Status::Ok);
    let new_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/auth/profile", Some(&alice.token)).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body["message"], "Token has been revoked");

    let (status, _) = app.get("/api/auth/profile", Some(&new_token)).await;
    assert_eq!(status, Status::Ok);

    let (status, _) = app.login("alice@example.com", common::PASSWORD).await;
    assert_eq!(status, Status::Unauthorized);
    let (status, _) = app.login("alice@example.com", "secret2").await;
    assert_eq!(status, Status::Ok);
}

#[rocket::async_test]
async fn test_upload_profile_image() {
    let app = common::setup().await;
    let alice = app.register("Alice", "alice@example.com").await;

    let (status, body) = app
        .post_file("/api/auth/upload-image", &alice.token, "image", "me.png", "image/png", b"\x89PNG fake")
        .await;
    assert_eq!(status, Status::Ok, "{}", body);
    let url = body["imageUrl"].as_str().unwrap();
    assert!(url.starts_with("/uploads/profiles/"));

    let (_, profile) = app.get("/api/auth/profile", Some(&alice.token)).await;
    assert_eq!(profile["data"]["profileImageUrl"], url);

    let (status, _) = app
        .post_file("/api/auth/upload-image", &alice.token, "image", "notes.txt", "text/plain", b"hello")
        .await;
    assert_eq!(status, Status::BadRequest);
}

#[rocket::async_test]
async fn test_health_and_unknown_route() {
    let app = common::setup().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/api/nothing-here", None).await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["success"], false);
}
