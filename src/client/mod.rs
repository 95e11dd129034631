//! Client layer: issues single `Publish` calls through the AWS SDK and maps its results to domain
//! values.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{AppName, BehaviorVersion};
use aws_sdk_sns::config::Region;
use aws_sdk_sns::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_sns::operation::RequestId;
use aws_sdk_sns::operation::publish::PublishError;
use tokio::sync::Mutex;
use url::Url;

use crate::BoxFuture;
use crate::domain::{Credentials, Publish, PublishReceipt};

/// Provider name attached to the static credentials handed to the SDK.
const CREDENTIALS_PROVIDER_NAME: &str = "sns-sms";

/// Sends one message to one phone number with the given credentials.
///
/// [`SnsClient`] is the production implementation; the dispatcher only depends on this trait.
pub trait Publisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        request: &'a Publish,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<PublishReceipt, SnsError>>;
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`SnsClient`].
///
/// This error preserves:
/// - API-level failures (SNS rejected the call),
/// - dispatch failures (DNS, TLS, timeouts, unreadable responses),
/// - client configuration failures.
pub enum SnsError {
    /// SDK dispatch failure: the call never produced an SNS answer.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// SNS rejected the call.
    #[error("{code}: {message}")]
    Api {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// The endpoint override is not a usable URL.
    #[error("invalid endpoint {endpoint}: {reason}")]
    Endpoint { endpoint: String, reason: String },

    /// A client setting was rejected by the SDK.
    #[error("invalid client configuration: {0}")]
    Config(#[source] Box<dyn StdError + Send + Sync>),
}

#[derive(Debug, Clone, Default)]
/// Builder for [`SnsClient`].
///
/// Use this when you need to customize the endpoint, timeout, or app name.
pub struct SnsClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    app_name: Option<String>,
}

impl SnsClientBuilder {
    /// Create a builder with regional endpoints and no timeout/app-name override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every call to `endpoint` instead of the regional SNS endpoint.
    ///
    /// Requests are still signed for the region in the credentials.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set a timeout applied to the entire publish operation.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// App name appended to the SDK's `User-Agent`.
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Build a [`SnsClient`].
    pub fn build(self) -> Result<SnsClient, SnsError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .map(parse_endpoint)
            .transpose()?;
        let app_name = self
            .app_name
            .map(AppName::new)
            .transpose()
            .map_err(|err| SnsError::Config(Box::new(err)))?;

        Ok(SnsClient {
            settings: Arc::new(Settings {
                endpoint,
                timeout: self.timeout,
                app_name,
            }),
            connection: Arc::new(Mutex::new(None)),
        })
    }
}

#[derive(Debug, Default)]
struct Settings {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    app_name: Option<AppName>,
}

#[derive(Clone)]
/// Amazon SNS client for single-recipient SMS.
///
/// The SDK client is built for the region and static keys in the supplied [`Credentials`] and
/// reused while they stay the same. Each call is sent once: SDK retries are disabled.
pub struct SnsClient {
    settings: Arc<Settings>,
    connection: Arc<Mutex<Option<(Credentials, aws_sdk_sns::Client)>>>,
}

impl fmt::Debug for SnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnsClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for SnsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SnsClient {
    /// Create a client using regional endpoints.
    ///
    /// For more customization, use [`SnsClient::builder`].
    pub fn new() -> Self {
        Self {
            settings: Arc::new(Settings::default()),
            connection: Arc::new(Mutex::new(None)),
        }
    }

    /// Start building a client with custom settings.
    pub fn builder() -> SnsClientBuilder {
        SnsClientBuilder::new()
    }

    /// Publish one SMS message through SNS.
    ///
    /// Errors:
    /// - [`SnsError::Api`] when SNS rejects the call,
    /// - [`SnsError::Transport`] when the request never completes or the answer is unreadable.
    pub async fn publish(
        &self,
        request: &Publish,
        credentials: &Credentials,
    ) -> Result<PublishReceipt, SnsError> {
        let sdk = self.sdk_client(credentials).await;

        tracing::debug!(
            region = credentials.region().as_str(),
            "publishing SMS through SNS"
        );

        let output = sdk
            .publish()
            .phone_number(request.destination())
            .message(request.message().as_str())
            .send()
            .await
            .map_err(error_from_sdk)?;

        Ok(PublishReceipt {
            message_id: output.message_id().unwrap_or_default().to_owned(),
            request_id: output.request_id().map(str::to_owned),
        })
    }

    async fn sdk_client(&self, credentials: &Credentials) -> aws_sdk_sns::Client {
        let mut connection = self.connection.lock().await;
        if let Some((cached, client)) = connection.as_ref() {
            if cached == credentials {
                return client.clone();
            }
        }

        let client = self.connect(credentials).await;
        *connection = Some((credentials.clone(), client.clone()));
        client
    }

    async fn connect(&self, credentials: &Credentials) -> aws_sdk_sns::Client {
        let provider = aws_credential_types::Credentials::new(
            credentials.access_key().as_str(),
            credentials.secret_key().expose(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region().as_str().to_owned()))
            .credentials_provider(provider)
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &self.settings.endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }
        if let Some(timeout) = self.settings.timeout {
            let timeouts = TimeoutConfig::builder().operation_timeout(timeout).build();
            loader = loader.timeout_config(timeouts);
        }
        if let Some(app_name) = &self.settings.app_name {
            loader = loader.app_name(app_name.clone());
        }

        aws_sdk_sns::Client::new(&loader.load().await)
    }
}

impl Publisher for SnsClient {
    fn publish<'a>(
        &'a self,
        request: &'a Publish,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<PublishReceipt, SnsError>> {
        Box::pin(SnsClient::publish(self, request, credentials))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<String, SnsError> {
    let url = Url::parse(endpoint).map_err(|err| SnsError::Endpoint {
        endpoint: endpoint.to_owned(),
        reason: err.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(SnsError::Endpoint {
            endpoint: endpoint.to_owned(),
            reason: "missing host".to_owned(),
        });
    }
    Ok(endpoint.to_owned())
}

fn error_from_sdk<R>(err: SdkError<PublishError, R>) -> SnsError
where
    R: fmt::Debug + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => api_error(context.err()),
        other => SnsError::Transport(Box::new(other)),
    }
}

fn api_error(err: &PublishError) -> SnsError {
    SnsError::Api {
        code: err.code().unwrap_or("Unknown").to_owned(),
        message: err.message().unwrap_or_default().to_owned(),
        request_id: err.request_id().map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use aws_sdk_sns::error::ErrorMetadata;
    use phonenumber::country;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::domain::{AccessKeyId, AwsRegion, MessageText, PhoneNumber, SecretAccessKey};

    use super::*;

    /// Single-connection HTTP endpoint answering with a canned response and keeping the request.
    #[derive(Debug, Clone)]
    struct FakeSns {
        endpoint: String,
        last_request: Arc<StdMutex<Option<String>>>,
    }

    impl FakeSns {
        async fn start(status: &str, body: &'static str) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = format!("http://{}", listener.local_addr().unwrap());
            let last_request = Arc::new(StdMutex::new(None));
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: text/xml\r\nx-amzn-requestid: {REQUEST_ID}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );

            let recorded = last_request.clone();
            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                *recorded.lock().unwrap() = Some(request);
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            });

            Self {
                endpoint,
                last_request,
            }
        }

        fn last_request(&self) -> String {
            self.last_request
                .lock()
                .unwrap()
                .clone()
                .expect("no request was sent")
        }

        fn client(&self) -> SnsClient {
            SnsClient::builder()
                .endpoint(self.endpoint.clone())
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap()
        }
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn credentials() -> Credentials {
        Credentials::new(
            AccessKeyId::new("AKIDEXAMPLE").unwrap(),
            SecretAccessKey::new("secret").unwrap(),
            AwsRegion::new("us-east-1").unwrap(),
        )
    }

    fn request() -> Publish {
        let phone = PhoneNumber::parse(Some(country::Id::CO), "3001234567").unwrap();
        Publish::new(&phone, MessageText::new("hola mundo").unwrap())
    }

    const REQUEST_ID: &str = "req-456";

    const OK_XML: &str = r#"<PublishResponse xmlns="http://sns.amazonaws.com/doc/2010-03-31/">
  <PublishResult><MessageId>msg-123</MessageId></PublishResult>
  <ResponseMetadata><RequestId>req-456</RequestId></ResponseMetadata>
</PublishResponse>"#;

    const ERROR_XML: &str = r#"<ErrorResponse xmlns="http://sns.amazonaws.com/doc/2010-03-31/">
  <Error>
    <Type>Sender</Type>
    <Code>InvalidParameter</Code>
    <Message>Invalid parameter: PhoneNumber</Message>
  </Error>
  <RequestId>req-456</RequestId>
</ErrorResponse>"#;

    #[tokio::test]
    async fn publish_sends_signed_request_with_stripped_number() {
        let sns = FakeSns::start("200 OK", OK_XML).await;

        let receipt = sns.client().publish(&request(), &credentials()).await.unwrap();
        assert_eq!(receipt.message_id, "msg-123");
        assert_eq!(receipt.request_id.as_deref(), Some("req-456"));

        let sent = sns.last_request();
        assert!(sent.starts_with("POST /"), "request: {sent}");
        assert!(sent.contains("Action=Publish"), "request: {sent}");
        assert!(sent.contains("PhoneNumber=573001234567"), "request: {sent}");
        assert!(sent.contains("Message=hola%20mundo") || sent.contains("Message=hola+mundo"));

        let lowered = sent.to_ascii_lowercase();
        assert!(lowered.contains("authorization: aws4-hmac-sha256 credential=akidexample/"));
        assert!(lowered.contains("/us-east-1/sns/aws4_request"));
    }

    #[tokio::test]
    async fn publish_maps_service_rejection_to_api_error() {
        let sns = FakeSns::start("400 Bad Request", ERROR_XML).await;

        let err = sns
            .client()
            .publish(&request(), &credentials())
            .await
            .unwrap_err();
        match &err {
            SnsError::Api {
                code,
                message,
                request_id,
            } => {
                assert_eq!(code, "InvalidParameter");
                assert_eq!(message, "Invalid parameter: PhoneNumber");
                assert_eq!(request_id.as_deref(), Some(REQUEST_ID));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "InvalidParameter: Invalid parameter: PhoneNumber");
    }

    #[test]
    fn service_error_metadata_becomes_api_error() {
        let err = PublishError::generic(
            ErrorMetadata::builder()
                .code("AuthorizationError")
                .message("User is not authorized to perform SNS:Publish")
                .custom("aws_request_id", "req-1")
                .build(),
        );

        match api_error(&err) {
            SnsError::Api {
                code,
                message,
                request_id,
            } => {
                assert_eq!(code, "AuthorizationError");
                assert_eq!(message, "User is not authorized to perform SNS:Publish");
                assert_eq!(request_id.as_deref(), Some("req-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dispatch_failures_become_transport_errors() {
        let err = SdkError::<PublishError, ()>::construction_failure("no route to host");
        assert!(matches!(error_from_sdk(err), SnsError::Transport(_)));
    }

    #[tokio::test]
    async fn sdk_client_is_reused_for_the_same_credentials() {
        let client = SnsClient::new();
        client.sdk_client(&credentials()).await;
        client.sdk_client(&credentials()).await;

        let other = Credentials::new(
            AccessKeyId::new("AKIDOTHER").unwrap(),
            SecretAccessKey::new("secret").unwrap(),
            AwsRegion::new("eu-west-1").unwrap(),
        );
        client.sdk_client(&other).await;

        let connection = client.connection.lock().await;
        let (cached, _) = connection.as_ref().unwrap();
        assert_eq!(cached, &other);
    }

    #[tokio::test]
    async fn client_is_usable_as_publisher_trait_object() {
        let sns = FakeSns::start("200 OK", OK_XML).await;
        let publisher: Arc<dyn Publisher> = Arc::new(sns.client());

        let receipt = publisher
            .publish(&request(), &credentials())
            .await
            .unwrap();
        assert_eq!(receipt.message_id, "msg-123");
    }

    #[test]
    fn builder_validates_endpoint_override() {
        let client = SnsClient::builder()
            .endpoint("http://localhost:4566/")
            .build()
            .unwrap();
        assert_eq!(
            client.settings.endpoint.as_deref(),
            Some("http://localhost:4566/")
        );

        let err = SnsClient::builder()
            .endpoint("not a url")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SnsError::Endpoint { .. }));
    }

    #[test]
    fn builder_rejects_invalid_app_name() {
        let err = SnsClient::builder()
            .app_name("has spaces")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SnsError::Config(_)));

        assert!(SnsClient::builder().app_name("sns-sms").build().is_ok());
    }
}
