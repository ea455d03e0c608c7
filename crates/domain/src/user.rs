use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// パスワードの最小文字数
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MAX_EMAIL_LENGTH: usize = 254;

/// ユーザーID（UUID v4）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 文字列からユーザーIDを復元する（UUID 形式でなければエラー）
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        uuid::Uuid::parse_str(id)
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| DomainError::InvalidUserId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 正規化済みメールアドレス（前後の空白を除去し小文字化）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let email = raw.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(DomainError::InvalidEmail(format!(
                "{raw:?} is not a valid email"
            )));
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return false;
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// 平文パスワードの強度ポリシーを検証する
pub fn validate_password(plaintext: &str) -> Result<(), DomainError> {
    if plaintext.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::InvalidPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// セッションの用途タグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTag {
    Auth,
}

impl AccessTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTag::Auth => "auth",
        }
    }

    pub fn from_string(tag: &str) -> Result<Self, DomainError> {
        match tag {
            "auth" => Ok(AccessTag::Auth),
            other => Err(DomainError::InvalidAccessTag(other.to_string())),
        }
    }
}

impl fmt::Display for AccessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ログイン 1 回分のセッション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access: AccessTag,
    pub token: String,
}

impl Session {
    pub fn auth(token: String) -> Self {
        Self {
            access: AccessTag::Auth,
            token,
        }
    }
}

/// ユーザー
///
/// パスワードダイジェストを含むため `Serialize` は実装しない。
/// クライアントへは [`UserProfile`] のみを返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub sessions: Vec<Session>,
}

impl User {
    /// セッションを持たない新規ユーザー
    pub fn new(email: Email, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email,
            password_hash,
            sessions: Vec::new(),
        }
    }

    /// セッションを末尾に追加したユーザーを返す（既存のセッションは維持）
    pub fn with_session(mut self, session: Session) -> Self {
        self.sessions.push(session);
        self
    }

    /// 指定トークンのセッションだけを取り除いたユーザーを返す
    ///
    /// 存在しないトークンの場合は何も変わらない。
    pub fn without_token(mut self, token: &str) -> Self {
        self.sessions.retain(|session| session.token != token);
        self
    }

    /// トークン文字列と用途タグの両方が一致するセッションを持つか
    pub fn has_session(&self, token: &str, access: AccessTag) -> bool {
        self.sessions
            .iter()
            .any(|session| session.token == token && session.access == access)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }
}

/// クライアントに公開するユーザー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: Email,
}
