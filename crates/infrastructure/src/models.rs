use crate::StoreError;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::DateTime;
use domain::{AccessTag, Email, Session, Todo, TodoId, User, UserId};
use std::collections::HashMap;

pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB アイテムのエンティティタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    User,
    EmailIndex,
    Todo,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "User",
            EntityType::EmailIndex => "EmailIndex",
            EntityType::Todo => "Todo",
        }
    }
}

/// Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbKeys {
    pub pk: String,
    pub sk: String,
}

impl DynamoDbKeys {
    /// ユーザー本体のキー
    pub fn for_user(user_id: &UserId) -> Self {
        Self {
            pk: format!("USER#{}", user_id.as_str()),
            sk: "PROFILE".to_string(),
        }
    }

    /// メールアドレス一意制約用のキー
    pub fn for_email(email: &Email) -> Self {
        Self {
            pk: format!("EMAIL#{}", email.as_str()),
            sk: "EMAIL".to_string(),
        }
    }

    /// ToDo のキー（作成者がパーティションキーに入る）
    pub fn for_todo(creator: &UserId, todo_id: &TodoId) -> Self {
        Self {
            pk: format!("USER#{}", creator.as_str()),
            sk: format!("TODO#{}", todo_id.as_str()),
        }
    }

    pub fn todo_partition(creator: &UserId) -> String {
        format!("USER#{}", creator.as_str())
    }

    pub const TODO_PREFIX: &'static str = "TODO#";

    pub fn into_item(self, entity_type: EntityType) -> Item {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S(self.pk));
        item.insert("SK".to_string(), AttributeValue::S(self.sk));
        item.insert(
            "EntityType".to_string(),
            AttributeValue::S(entity_type.as_str().to_string()),
        );
        item
    }
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Result<&'a str, StoreError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| StoreError::Corrupt(format!("missing string attribute {name}")))
}

pub fn sessions_to_attribute(sessions: &[Session]) -> AttributeValue {
    AttributeValue::L(
        sessions
            .iter()
            .map(|session| {
                AttributeValue::M(HashMap::from([
                    (
                        "access".to_string(),
                        AttributeValue::S(session.access.as_str().to_string()),
                    ),
                    ("token".to_string(), AttributeValue::S(session.token.clone())),
                ]))
            })
            .collect(),
    )
}

fn sessions_from_attribute(value: Option<&AttributeValue>) -> Result<Vec<Session>, StoreError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let list = value
        .as_l()
        .map_err(|_| StoreError::Corrupt("sessions is not a list".to_string()))?;

    list.iter()
        .map(|entry| {
            let map = entry
                .as_m()
                .map_err(|_| StoreError::Corrupt("session is not a map".to_string()))?;
            let access = AccessTag::from_string(string_attr(map, "access")?)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            Ok(Session {
                access,
                token: string_attr(map, "token")?.to_string(),
            })
        })
        .collect()
}

pub fn user_to_item(user: &User) -> Item {
    let mut item = DynamoDbKeys::for_user(&user.id).into_item(EntityType::User);
    item.insert("id".to_string(), AttributeValue::S(user.id.as_str().to_string()));
    item.insert(
        "email".to_string(),
        AttributeValue::S(user.email.as_str().to_string()),
    );
    item.insert(
        "password_hash".to_string(),
        AttributeValue::S(user.password_hash.clone()),
    );
    item.insert("sessions".to_string(), sessions_to_attribute(&user.sessions));
    item
}

pub fn item_to_user(item: &Item) -> Result<User, StoreError> {
    let corrupt = |e: domain::DomainError| StoreError::Corrupt(e.to_string());

    Ok(User {
        id: UserId::parse(string_attr(item, "id")?).map_err(corrupt)?,
        email: Email::parse(string_attr(item, "email")?).map_err(corrupt)?,
        password_hash: string_attr(item, "password_hash")?.to_string(),
        sessions: sessions_from_attribute(item.get("sessions"))?,
    })
}

pub fn email_index_item(user: &User) -> Item {
    let mut item = DynamoDbKeys::for_email(&user.email).into_item(EntityType::EmailIndex);
    item.insert(
        "user_id".to_string(),
        AttributeValue::S(user.id.as_str().to_string()),
    );
    item
}

pub fn email_index_user_id(item: &Item) -> Result<UserId, StoreError> {
    UserId::parse(string_attr(item, "user_id")?).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub fn todo_to_item(todo: &Todo) -> Item {
    let mut item = DynamoDbKeys::for_todo(todo.creator(), todo.id()).into_item(EntityType::Todo);
    item.insert("id".to_string(), AttributeValue::S(todo.id().as_str().to_string()));
    item.insert("text".to_string(), AttributeValue::S(todo.text().to_string()));
    item.insert("completed".to_string(), AttributeValue::Bool(todo.completed()));
    if let Some(at) = todo.completed_at() {
        item.insert(
            "completed_at".to_string(),
            AttributeValue::N(at.timestamp_millis().to_string()),
        );
    }
    item.insert(
        "creator".to_string(),
        AttributeValue::S(todo.creator().as_str().to_string()),
    );
    item
}

pub fn item_to_todo(item: &Item) -> Result<Todo, StoreError> {
    let corrupt = |e: domain::DomainError| StoreError::Corrupt(e.to_string());

    let completed_at = match item.get("completed_at").and_then(|v| v.as_n().ok()) {
        Some(millis) => {
            let millis: i64 = millis
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("invalid completed_at {millis}")))?;
            Some(
                DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| StoreError::Corrupt(format!("invalid completed_at {millis}")))?,
            )
        }
        None => None,
    };

    Todo::from_parts(
        TodoId::parse(string_attr(item, "id")?).map_err(corrupt)?,
        string_attr(item, "text")?,
        completed_at,
        UserId::parse(string_attr(item, "creator")?).map_err(corrupt)?,
    )
    .map_err(corrupt)
}
