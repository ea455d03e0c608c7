//! パスワードのハッシュ化と照合（Argon2id）
//!
//! ダイジェストは PHC 形式の文字列（`$argon2id$v=19$...`）で保存する。
//! 平文パスワードはどこにも保存・ログ出力しない。

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use domain::User;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Invalid password hash: {0}")]
    MalformedDigest(String),
}

/// `hash(plaintext) -> digest` / `verify(plaintext, digest) -> bool`
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError>;

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordHashError>;
}

#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordHashError::Hash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(digest).map_err(|e| PasswordHashError::MalformedDigest(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

/// ユーザーのダイジェストと平文パスワードを照合する
pub fn check_credentials(
    user: &User,
    plaintext: &str,
    hasher: &dyn PasswordHasher,
) -> Result<bool, PasswordHashError> {
    hasher.verify(plaintext, &user.password_hash)
}
