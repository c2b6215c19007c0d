use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::config::{Credentials, Region};
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use tracing::{debug, info};

use super::{DeleteOutcome, QueueClient, QueueMessage};
use crate::core::config::SourceConfig;
use crate::errors::DatasourceError;

const CREDENTIALS_PROVIDER_NAME: &str = "sqs-datasource";

/// SQS-backed [`QueueClient`] holding one client for its whole lifetime.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: SqsClient,
}

impl SqsQueue {
    /// Build a client for the configured region.
    ///
    /// Explicit key/secret become static credentials; without them the SDK
    /// default credential chain is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub async fn connect(config: &SourceConfig) -> Result<Self, DatasourceError> {
        config.validate()?;
        let region = Region::new(config.region.clone());

        let client = match (config.access_key(), config.secret_key()) {
            (Some(key), Some(secret)) => {
                let credentials =
                    Credentials::new(key, secret, None, None, CREDENTIALS_PROVIDER_NAME);
                let sqs_config = aws_sdk_sqs::config::Builder::new()
                    .behavior_version(aws_sdk_sqs::config::BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
                    .build();
                SqsClient::from_conf(sqs_config)
            }
            _ => {
                let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                SqsClient::new(&shared_config)
            }
        };

        info!(region = %config.region, queue_url = %config.queue_url(), "SQS client ready");
        Ok(Self { client })
    }

    pub fn from_client(client: SqsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueClient for SqsQueue {
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), DatasourceError> {
        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                DatasourceError::AwsError(format!(
                    "Failed to send message to SQS: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: Option<u32>,
    ) -> Result<Vec<QueueMessage>, DatasourceError> {
        let max = max_messages.map(|m| i32::try_from(m).unwrap_or(i32::MAX));
        let resp = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .set_max_number_of_messages(max)
            .send()
            .await
            .map_err(|e| {
                DatasourceError::AwsError(format!(
                    "Failed to receive messages from SQS: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let messages: Vec<QueueMessage> = resp
            .messages()
            .iter()
            .map(|m| QueueMessage {
                body: m.body().unwrap_or_default().to_string(),
                message_id: m.message_id().unwrap_or_default().to_string(),
                receipt_handle: m.receipt_handle().unwrap_or_default().to_string(),
            })
            .collect();
        debug!(count = messages.len(), "received SQS messages");
        Ok(messages)
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<DeleteOutcome, DatasourceError> {
        match self
            .client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
        {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            // SQS answered and said no (bad or expired receipt handle, etc.)
            Err(e) if e.as_service_error().is_some() => {
                let body = e
                    .raw_response()
                    .and_then(|resp| resp.body().bytes())
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .filter(|body| !body.is_empty())
                    .unwrap_or_else(|| DisplayErrorContext(&e).to_string());
                Ok(DeleteOutcome::Rejected { body })
            }
            Err(e) => Err(DatasourceError::AwsError(format!(
                "Failed to delete SQS message: {}",
                DisplayErrorContext(&e)
            ))),
        }
    }

    async fn queue_depth(&self, queue_url: &str) -> Result<u64, DatasourceError> {
        let resp = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| {
                DatasourceError::AwsError(format!(
                    "Failed to read SQS queue attributes: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let raw = resp
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .ok_or_else(|| {
                DatasourceError::ParseError(
                    "ApproximateNumberOfMessages missing from response".to_string(),
                )
            })?;

        raw.parse::<u64>().map_err(|e| {
            DatasourceError::ParseError(format!("ApproximateNumberOfMessages {raw:?}: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::config::retry::RetryConfig;
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_runtime_api::http::{Request, Response, StatusCode};
    use aws_smithy_types::body::SdkBody;

    const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/jobs";

    fn reply(status: u16, body: &str) -> ReplayEvent {
        let mut response = Response::new(
            StatusCode::try_from(status).unwrap(),
            SdkBody::from(body.to_string()),
        );
        response
            .headers_mut()
            .insert("Content-Type", "application/x-amz-json-1.0");
        ReplayEvent::new(Request::new(SdkBody::empty()), response)
    }

    fn replay_queue(events: Vec<ReplayEvent>) -> SqsQueue {
        let sqs_config = aws_sdk_sqs::config::Builder::new()
            .behavior_version(aws_sdk_sqs::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .http_client(StaticReplayClient::new(events))
            .build();
        SqsQueue::from_client(SqsClient::from_conf(sqs_config))
    }

    #[tokio::test]
    async fn test_delete_service_error_is_rejected_with_raw_body() {
        let queue = replay_queue(vec![reply(
            400,
            r#"{"__type":"com.amazonaws.sqs#ReceiptHandleIsInvalid","message":"The input receipt handle is invalid."}"#,
        )]);

        let outcome = queue.delete_message(QUEUE_URL, "stale").await.unwrap();

        match outcome {
            DeleteOutcome::Rejected { body } => {
                assert!(body.contains("ReceiptHandleIsInvalid"));
            }
            DeleteOutcome::Deleted => panic!("expected the delete to be rejected"),
        }
    }

    #[tokio::test]
    async fn test_delete_success() {
        let queue = replay_queue(vec![reply(200, "{}")]);

        let outcome = queue.delete_message(QUEUE_URL, "r-1").await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_delete_dispatch_failure_is_error() {
        // No recorded responses, so the HTTP client fails before SQS answers.
        let queue = replay_queue(Vec::new());

        let result = queue.delete_message(QUEUE_URL, "r-1").await;

        assert!(matches!(result, Err(DatasourceError::AwsError(_))));
    }

    #[tokio::test]
    async fn test_receive_maps_missing_fields_to_empty_strings() {
        let queue = replay_queue(vec![reply(
            200,
            r#"{"Messages":[{"MessageId":"m-1","ReceiptHandle":"r-1","Body":"{\"n\":1}"},{"MessageId":"m-2"}]}"#,
        )]);

        let messages = queue.receive_messages(QUEUE_URL, Some(2)).await.unwrap();

        assert_eq!(
            messages,
            vec![
                QueueMessage {
                    body: r#"{"n":1}"#.to_string(),
                    message_id: "m-1".to_string(),
                    receipt_handle: "r-1".to_string(),
                },
                QueueMessage {
                    body: String::new(),
                    message_id: "m-2".to_string(),
                    receipt_handle: String::new(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_receive_empty_response() {
        let queue = replay_queue(vec![reply(200, "{}")]);

        let messages = queue.receive_messages(QUEUE_URL, None).await.unwrap();

        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_queue_depth_parses_attribute() {
        let queue = replay_queue(vec![reply(
            200,
            r#"{"Attributes":{"ApproximateNumberOfMessages":"42"}}"#,
        )]);

        assert_eq!(queue.queue_depth(QUEUE_URL).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_queue_depth_missing_attribute_is_parse_error() {
        let queue = replay_queue(vec![reply(200, r#"{"Attributes":{}}"#)]);

        let result = queue.queue_depth(QUEUE_URL).await;

        assert!(matches!(result, Err(DatasourceError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_queue_depth_non_numeric_is_parse_error() {
        let queue = replay_queue(vec![reply(
            200,
            r#"{"Attributes":{"ApproximateNumberOfMessages":"lots"}}"#,
        )]);

        let result = queue.queue_depth(QUEUE_URL).await;

        assert!(matches!(result, Err(DatasourceError::ParseError(_))));
    }
}
