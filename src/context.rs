//! Application context: configuration, completion client and cloud access,
//! built once at startup and passed to whatever needs them.

use chrono::Utc;
use tracing::info;

use crate::client::{ClientError, CompletionClient, StreamingClient};
use crate::config::AppConfig;
use crate::dashboard::{build_dashboard, Dashboard};
use crate::inventory::{
    fetch_infrastructure, region_display_name, CloudInventoryProvider, InfrastructureSnapshot,
};
use crate::logs::{
    format_for_display, recent_logs, LogEntry, LogGroup, LogProvider, DEFAULT_LOG_WINDOW,
};
use crate::prompt;
use crate::providers::OpenAiTransport;
use crate::stream::FragmentStream;
use crate::transport::Transport;

/// Everything the popup flows need, with explicit ownership.
///
/// # Example
/// ```ignore
/// let config = AppConfig::from_env()?;
/// let mut context = AppContext::from_config(config, my_cloud)?;
/// context.connect().await?;
///
/// let mut answer = context.analyze("Which instances could be downsized?").await?;
/// while let Some(fragment) = answer.next().await {
///     print!("{}", fragment?);
/// }
/// ```
pub struct AppContext<T, P> {
    config: AppConfig,
    client: CompletionClient<T>,
    provider: P,
    identity: Option<String>,
}

impl<P> AppContext<OpenAiTransport, P> {
    /// Context talking to the configured OpenAI endpoint.
    pub fn from_config(config: AppConfig, provider: P) -> Result<Self, ClientError> {
        let transport = OpenAiTransport::new(config.transport_options())?;
        let client = CompletionClient::new(transport, config.model_options());
        Ok(Self::new(config, client, provider))
    }
}

impl<T, P> AppContext<T, P> {
    pub fn new(config: AppConfig, client: CompletionClient<T>, provider: P) -> Self {
        Self {
            config,
            client,
            provider,
            identity: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &CompletionClient<T> {
        &self.client
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    /// Caller identity reported by the last successful [`AppContext::connect`].
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }
}

impl<T: Transport, P: CloudInventoryProvider> AppContext<T, P> {
    /// Check the cloud credentials and remember the caller identity.
    pub async fn connect(&mut self) -> Result<&str, ClientError> {
        self.identity = None;
        let identity = self.provider.verify_access().await?;
        let region = self.config.cloud.default_region.as_str();
        info!(
            %identity,
            region = region_display_name(region).unwrap_or(region),
            "connected to cloud account"
        );
        Ok(self.identity.insert(identity).as_str())
    }

    /// Current inventory of the configured region.
    pub async fn snapshot(&self) -> Result<InfrastructureSnapshot, ClientError> {
        self.ensure_connected()?;
        Ok(fetch_infrastructure(&self.provider, &self.config.cloud.default_region).await)
    }

    /// Answer `question` about the account, streamed.
    pub async fn analyze(&self, question: &str) -> Result<FragmentStream, ClientError> {
        self.ensure_connected()?;
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::InvalidRequest("question is empty".to_string()));
        }

        let snapshot = self.snapshot().await?;
        let messages = prompt::infrastructure_analysis(&snapshot, question)?;
        self.client.chat_stream(messages).await
    }

    /// Cost figures and recommendations for the dashboard.
    pub async fn dashboard(&self) -> Result<Dashboard, ClientError> {
        self.ensure_connected()?;
        build_dashboard(&self.provider, Utc::now().date_naive()).await
    }
}

impl<T: Transport, P: CloudInventoryProvider + LogProvider> AppContext<T, P> {
    /// Log groups that can be summarized.
    pub async fn log_groups(&self) -> Result<Vec<LogGroup>, ClientError> {
        self.ensure_connected()?;
        self.provider.log_groups().await
    }

    /// Last hour of events from `group`, oldest first.
    pub async fn recent_logs(&self, group: &str) -> Result<Vec<LogEntry>, ClientError> {
        self.ensure_connected()?;
        recent_logs(&self.provider, group, DEFAULT_LOG_WINDOW, Utc::now()).await
    }

    /// Summarize the last hour of `group`, streamed.
    pub async fn summarize_logs(&self, group: &str) -> Result<FragmentStream, ClientError> {
        let entries = self.recent_logs(group).await?;
        if entries.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "no recent log events in {}",
                group
            )));
        }

        let messages = prompt::log_analysis(&format_for_display(&entries));
        self.client.chat_stream(messages).await
    }
}
