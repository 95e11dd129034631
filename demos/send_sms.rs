use std::io;

use sns_sms::{
    AccessKeyId, AwsRegion, BasicContact, Integration, SecretAccessKey, SendOutcome,
    SmsDispatcher, SnsClient, StaticIntegrations,
};

fn required(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sns_sms=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let integration = Integration::new(true)
        .with_api_key(AccessKeyId::FIELD, required("SNS_API_KEY")?)
        .with_api_key(SecretAccessKey::FIELD, required("SNS_SECRET_ID")?)
        .with_api_key(AwsRegion::FIELD, required("SNS_REGION")?);
    let phone = required("SNS_PHONE")?;
    let message = std::env::var("SNS_MESSAGE")
        .unwrap_or_else(|_| "Hello from the sns-sms demo.".to_owned());

    let integrations =
        StaticIntegrations::new().with(sns_sms::DEFAULT_INTEGRATION_NAME, integration);
    let dispatcher = SmsDispatcher::with_integrations(integrations, SnsClient::new());

    let contact = BasicContact::new("demo", phone);
    match dispatcher.send(&contact, &message).await {
        SendOutcome::Sent(receipt) => {
            println!(
                "message_id: {}, request_id: {:?}",
                receipt.message_id, receipt.request_id
            );
            Ok(())
        }
        SendOutcome::NoRecipient => Err("SNS_PHONE is empty".into()),
        SendOutcome::Failed(err) => Err(err.into()),
    }
}
