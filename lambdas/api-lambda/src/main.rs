use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{run, service_fn, tracing, Error, Request};
use std::sync::Arc;
use todo_shared::attachments::S3AttachmentStore;
use todo_shared::config::Config;
use todo_shared::todos::TodoService;
use todo_shared::todos_access::DynamoTodoStore;
use todo_shared::AppState;

mod http_handler;
mod identity;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::from_env()?;

    // Initialize AWS clients once at startup
    let aws_config = aws_config::load_from_env().await;

    let dynamo_client = if config.is_offline {
        tracing::info!("Creating a local DynamoDB client at {}", config.local_endpoint);
        let local_config = aws_sdk_dynamodb::config::Builder::from(&aws_config)
            .endpoint_url(&config.local_endpoint)
            .build();
        DynamoClient::from_conf(local_config)
    } else {
        DynamoClient::new(&aws_config)
    };

    let items = DynamoTodoStore::new(
        dynamo_client,
        &config.todos_table,
        &config.todos_by_user_index,
    );
    let attachments = S3AttachmentStore::new(
        S3Client::new(&aws_config),
        &config.attachments_bucket,
        config.signed_url_expiration,
    );
    let state = AppState::new(config, TodoService::new(Arc::new(items), Arc::new(attachments)));

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
