use crate::models::{item_to_todo, todo_to_item, DynamoDbKeys};
use crate::{DynamoDbClient, StoreError, TodoStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use domain::{Todo, TodoId, TodoPatch, UserId};
use tracing::{debug, info};

/// ToDo リポジトリ（DynamoDB）
///
/// 作成者をパーティションキーに含めるため、キー指定の操作は
/// ストア側で `(id, creator)` に絞り込まれる。
#[derive(Clone)]
pub struct DynamoTodoRepository {
    db: DynamoDbClient,
}

impl DynamoTodoRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoStore for DynamoTodoRepository {
    async fn insert(&self, todo: &Todo) -> Result<(), StoreError> {
        info!("ToDoを保存中: todo_id={}, creator={}", todo.id(), todo.creator());

        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| self.db.convert_error(e))?;

        Ok(())
    }

    async fn find_by_creator(&self, creator: &UserId) -> Result<Vec<Todo>, StoreError> {
        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(
                    ":pk",
                    AttributeValue::S(DynamoDbKeys::todo_partition(creator)),
                )
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(DynamoDbKeys::TODO_PREFIX.to_string()),
                )
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| self.db.convert_error(e))?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }

        debug!("ToDo一覧取得完了: {} 件", todos.len());
        Ok(todos)
    }

    async fn find_one(&self, id: &TodoId, creator: &UserId) -> Result<Option<Todo>, StoreError> {
        let keys = DynamoDbKeys::for_todo(creator, id);

        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .send()
            .await
            .map_err(|e| self.db.convert_error(e))?;

        output.item().map(item_to_todo).transpose()
    }

    async fn find_one_and_update(
        &self,
        id: &TodoId,
        creator: &UserId,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let keys = DynamoDbKeys::for_todo(creator, id);

        let mut set_parts = vec!["completed = :completed"];
        let mut builder = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_values(":completed", AttributeValue::Bool(patch.completed()))
            .return_values(ReturnValue::AllNew);

        if let Some(text) = patch.text() {
            set_parts.push("#text = :text");
            builder = builder
                .expression_attribute_names("#text", "text")
                .expression_attribute_values(":text", AttributeValue::S(text.to_string()));
        }

        // 完了日時は常に completed に合わせて設定または削除する
        let expression = match patch.completed_at() {
            Some(at) => {
                set_parts.push("completed_at = :completed_at");
                builder = builder.expression_attribute_values(
                    ":completed_at",
                    AttributeValue::N(at.timestamp_millis().to_string()),
                );
                format!("SET {}", set_parts.join(", "))
            }
            None => format!("SET {} REMOVE completed_at", set_parts.join(", ")),
        };

        match builder.update_expression(expression).send().await {
            Ok(output) => output.attributes().map(item_to_todo).transpose(),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    debug!("更新対象のToDoが見つかりません: todo_id={}", id);
                    Ok(None)
                } else {
                    Err(self.db.convert_error(service_error))
                }
            }
        }
    }

    async fn find_one_and_remove(
        &self,
        id: &TodoId,
        creator: &UserId,
    ) -> Result<Option<Todo>, StoreError> {
        let keys = DynamoDbKeys::for_todo(creator, id);

        let output = self
            .db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| self.db.convert_error(e))?;

        output.attributes().map(item_to_todo).transpose()
    }
}
