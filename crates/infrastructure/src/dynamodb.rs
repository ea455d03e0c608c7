use crate::StoreError;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::Client;
use shared::Config;

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        // DynamoDB Local などへの接続
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// SDK エラーをストアエラーに変換
    pub fn convert_error<E: std::error::Error>(&self, error: E) -> StoreError {
        StoreError::Backend(DisplayErrorContext(&error).to_string())
    }
}
