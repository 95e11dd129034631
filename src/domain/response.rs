#[derive(Debug, Clone, PartialEq, Eq)]
/// Acknowledgement returned by SNS for an accepted `Publish` call.
pub struct PublishReceipt {
    pub message_id: String,
    pub request_id: Option<String>,
}
