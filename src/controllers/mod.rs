//! HTTP ハンドラ。Djangoの `views.py` に相当します。
//! 入力の取り出しとレスポンスの形だけを扱い、処理はサービス層に任せる。

pub mod auth;
pub mod catchers;
pub mod reports;
pub mod tasks;
pub mod users;
