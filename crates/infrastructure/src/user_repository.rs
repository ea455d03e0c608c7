use crate::models::{
    email_index_item, email_index_user_id, item_to_user, sessions_to_attribute, user_to_item,
    DynamoDbKeys,
};
use crate::{DynamoDbClient, StoreError, UserStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, ReturnValue, TransactWriteItem};
use domain::{Email, User, UserId};
use tracing::{debug, info};

/// ユーザーリポジトリ（DynamoDB）
///
/// ユーザー本体とメールアドレスの一意制約用アイテムを同一トランザクションで書き込む。
#[derive(Clone)]
pub struct DynamoUserRepository {
    db: DynamoDbClient,
}

impl DynamoUserRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }

    fn conditional_put(&self, item: crate::models::Item) -> Result<TransactWriteItem, StoreError> {
        let put = Put::builder()
            .table_name(self.db.table_name())
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(PK)")
            .build()
            .map_err(|e| self.db.convert_error(e))?;
        Ok(TransactWriteItem::builder().put(put).build())
    }
}

#[async_trait]
impl UserStore for DynamoUserRepository {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        info!("ユーザーを保存中: user_id={}", user.id);

        let result = self
            .db
            .client()
            .transact_write_items()
            .transact_items(self.conditional_put(user_to_item(user))?)
            .transact_items(self.conditional_put(email_index_item(user))?)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("ユーザー保存完了: {}", user.id);
                Ok(())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                let condition_failed = match &service_error {
                    TransactWriteItemsError::TransactionCanceledException(canceled) => canceled
                        .cancellation_reasons()
                        .iter()
                        .any(|reason| reason.code() == Some("ConditionalCheckFailed")),
                    _ => false,
                };

                if condition_failed {
                    Err(StoreError::DuplicateKey("email".to_string()))
                } else {
                    Err(self.db.convert_error(service_error))
                }
            }
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let keys = DynamoDbKeys::for_user(id);

        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            // ログアウト直後の認証や登録直後のログインで古い値を読まない
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| self.db.convert_error(e))?;

        output.item().map(item_to_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let keys = DynamoDbKeys::for_email(email);

        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| self.db.convert_error(e))?;

        match output.item() {
            Some(item) => self.find_by_id(&email_index_user_id(item)?).await,
            None => Ok(None),
        }
    }

    async fn save_sessions(&self, user: &User) -> Result<Option<User>, StoreError> {
        let keys = DynamoDbKeys::for_user(&user.id);

        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .update_expression("SET sessions = :sessions")
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_values(":sessions", sessions_to_attribute(&user.sessions))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                debug!(
                    "セッション更新完了: user_id={}, sessions={}",
                    user.id,
                    user.sessions.len()
                );
                output.attributes().map(item_to_user).transpose()
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    Ok(None)
                } else {
                    Err(self.db.convert_error(service_error))
                }
            }
        }
    }
}
