//! Conversations sent for infrastructure questions and log summaries.

use nonempty::{nonempty, NonEmpty};

use crate::client::ClientError;
use crate::inventory::InfrastructureSnapshot;
use crate::model::ChatMessage;

const INFRASTRUCTURE_SYSTEM: &str = "You are an AWS infrastructure expert assistant.";

const LOG_ANALYSIS_SYSTEM: &str = "You are an expert at analyzing AWS CloudWatch logs. Focus on:
- Error patterns and their frequencies
- Performance issues
- Security-related events
- Unusual activity patterns
Provide a concise summary highlighting the most important findings.";

/// Ask `question` about the account described by `snapshot`.
pub fn infrastructure_analysis(
    snapshot: &InfrastructureSnapshot,
    question: &str,
) -> Result<NonEmpty<ChatMessage>, ClientError> {
    let inventory = snapshot.to_json()?;
    Ok(nonempty![
        ChatMessage::system(INFRASTRUCTURE_SYSTEM),
        ChatMessage::user(format!(
            "AWS Infrastructure:\n{}\n\nQuestion: {}",
            inventory, question
        ))
    ])
}

/// Ask for a summary of already formatted log lines.
pub fn log_analysis(logs: &str) -> NonEmpty<ChatMessage> {
    nonempty![
        ChatMessage::system(LOG_ANALYSIS_SYSTEM),
        ChatMessage::user(format!(
            "Analyze these CloudWatch logs and provide a summary of key findings:\n\n{}",
            logs
        ))
    ]
}
