use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// 存在しないユーザーでログインされたときに照合するダミーハッシュ。
/// 照合にかかる時間を揃え、メールアドレスの存在を推測されないようにする。
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$gbLN0HdzIAg3N/2UmMqJYQ$5xWILs4rN6xIJJE9uPQSAggsNMlPCFlRnS3iqv63Juk";

/// パスワードを Argon2id でハッシュ化します。
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// パスワードを検証します。
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match argon2::PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// ハッシュ化はCPU負荷が高いため、ブロッキング用スレッドで実行します。
pub async fn hash_password_async(password: String) -> Result<String, AppError> {
    rocket::tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

/// `hash` が `None` の場合はダミーハッシュと照合し、常に `false` を返します。
pub async fn verify_password_async(password: String, hash: Option<String>) -> Result<bool, AppError> {
    rocket::tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            verify_password(&password, DUMMY_HASH);
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// JWT のクレーム。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// ユーザーID
    pub sub: String,
    /// 発行時点のトークン世代
    pub ver: i32,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// 署名付きトークンを発行します (HS256)。
pub fn issue_token(secret: &str, user_id: i32, token_version: i32, ttl_days: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        ver: token_version,
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// トークンの署名と有効期限を検証し、クレームを返します。
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthenticated("Token expired".into())
            }
            _ => AppError::Unauthenticated("Not authorized to access this route".into()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_password_hash_and_verify() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("Failed to hash");

        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_different_passwords_produce_different_hashes() {
        let hash1 = hash_password("password1").unwrap();
        let hash2 = hash_password("password2").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_dummy_hash_is_well_formed() {
        assert!(argon2::PasswordHash::new(DUMMY_HASH).is_ok());
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(SECRET, 42, 3, 7).unwrap();
        let claims = decode_token(SECRET, &token).unwrap();

        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.ver, 3);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let token = issue_token(SECRET, 1, 0, 7).unwrap();
        assert!(matches!(
            decode_token("another-secret", &token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(SECRET, 1, 0, -1).unwrap();
        let err = decode_token(SECRET, &token).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(decode_token(SECRET, "not-a-jwt").is_err());
    }
}
