use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid UserId: {0}")]
    InvalidUserId(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid todo text: {0}")]
    InvalidText(String),

    #[error("Invalid access tag: {0}")]
    InvalidAccessTag(String),

    #[error("Inconsistent todo document: {0}")]
    InconsistentTodo(String),
}

impl DomainError {
    /// クライアントに返すフィールド名
    pub fn field(&self) -> &'static str {
        match self {
            DomainError::InvalidTodoId(_) | DomainError::InconsistentTodo(_) => "_id",
            DomainError::InvalidUserId(_) => "_creator",
            DomainError::InvalidEmail(_) => "email",
            DomainError::InvalidPassword(_) => "password",
            DomainError::InvalidText(_) => "text",
            DomainError::InvalidAccessTag(_) => "access",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_follow_wire_format() {
        assert_eq!(DomainError::InvalidEmail("x".into()).field(), "email");
        assert_eq!(DomainError::InvalidPassword("x".into()).field(), "password");
        assert_eq!(DomainError::InvalidText("x".into()).field(), "text");
        assert_eq!(DomainError::InvalidTodoId("x".into()).field(), "_id");
    }
}
