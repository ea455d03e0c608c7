pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod store;
pub mod todo_repository;
pub mod user_repository;

pub use dynamodb::*;
pub use memory::*;
pub use store::*;
pub use todo_repository::*;
pub use user_repository::*;

use shared::{Config, StoreBackend};
use std::sync::Arc;

/// ハンドラーに注入するストア一式
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::default()),
            todos: Arc::new(InMemoryTodoStore::default()),
        }
    }

    /// 設定に従ってバックエンドに接続する
    pub async fn connect(config: &Config) -> Self {
        match config.store_backend {
            StoreBackend::Memory => {
                tracing::info!("インメモリストアを使用します");
                Self::in_memory()
            }
            StoreBackend::DynamoDb => {
                let db = DynamoDbClient::new(config).await;
                tracing::info!(table = db.table_name(), "DynamoDB ストアに接続しました");
                Self {
                    users: Arc::new(DynamoUserRepository::new(db.clone())),
                    todos: Arc::new(DynamoTodoRepository::new(db)),
                }
            }
        }
    }
}
