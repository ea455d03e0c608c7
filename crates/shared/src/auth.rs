use domain::{AccessTag, Session, User, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// セッショントークンに署名されるクレーム
///
/// `jti` は発行ごとに変わる乱数で、同じユーザーへの同時セッションでも
/// トークン文字列が必ず異なるようにする。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub access: AccessTag,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        UserId::parse(&self.sub).map_err(|_| TokenError::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// 改ざん・形式不正・署名鍵違いを区別しない
    #[error("Invalid token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// セッショントークンの発行と検証（HS256）
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        // 有効期限は持たない。失効はログアウトでセッションを消すことで行う
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// `{ sub: user_id, access: "auth" }` を含むトークンを発行
    pub fn issue(&self, user_id: &UserId) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.as_str().to_string(),
            access: AccessTag::Auth,
            iat: chrono::Utc::now().timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// 署名を検証してクレームを返す
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.access != AccessTag::Auth {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims)
    }
}

/// 新しいトークンを発行し、そのセッションを追加したユーザーを返す
///
/// 永続化は呼び出し側の責務。
pub fn generate_auth_token(user: User, tokens: &TokenService) -> Result<(User, String), TokenError> {
    let token = tokens.issue(&user.id)?;
    let user = user.with_session(Session::auth(token.clone()));
    Ok((user, token))
}
