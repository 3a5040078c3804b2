//! Cloud inventory capability and the snapshot fed to the analysis prompt.
//!
//! A [`CloudInventoryProvider`] lists one kind of resource per method. The
//! provider is implemented once per target cloud; nothing here knows how the
//! listing is done.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::client::ClientError;

/// A virtual machine instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ec2Instance {
    pub id: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub state: String,
    #[serde(rename = "az", skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Ec2Instance {
    /// Value of the `Name` tag, or "Unnamed".
    pub fn name(&self) -> &str {
        self.tags.get("Name").map(String::as_str).unwrap_or("Unnamed")
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// A serverless function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LambdaFunction {
    pub name: String,
    pub runtime: Option<String>,
    /// Memory in MB
    pub memory: Option<u32>,
    /// Timeout in seconds
    pub timeout: Option<u32>,
    pub last_modified: Option<String>,
}

/// A managed relational database instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseInstance {
    pub identifier: String,
    pub engine: String,
    pub status: Option<String>,
    /// Instance class, e.g. `db.t3.micro`
    pub size: Option<String>,
}

/// A cache cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheCluster {
    pub id: String,
    pub engine: String,
    pub status: Option<String>,
}

/// Cost for one billing period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub amount: f64,
    pub unit: String,
}

/// Read access to one cloud account.
#[async_trait]
pub trait CloudInventoryProvider: Send + Sync {
    /// Check the credentials work; returns the caller identity.
    async fn verify_access(&self) -> Result<String, ClientError>;

    /// All instances, in any state.
    async fn ec2_instances(&self) -> Result<Vec<Ec2Instance>, ClientError>;

    async fn lambda_functions(&self) -> Result<Vec<LambdaFunction>, ClientError>;

    async fn rds_instances(&self) -> Result<Vec<DatabaseInstance>, ClientError>;

    /// Cluster ARNs.
    async fn ecs_clusters(&self) -> Result<Vec<String>, ClientError>;

    async fn elasticache_clusters(&self) -> Result<Vec<CacheCluster>, ClientError>;

    /// Unblended cost per month between `start` (inclusive) and `end` (exclusive).
    async fn cost_and_usage(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CostPeriod>, ClientError>;
}

/// Resources of one kind plus their count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInventory<T> {
    pub items: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ServiceInventory<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Services {
    pub ec2: ServiceInventory<Ec2Instance>,
    pub lambda: ServiceInventory<LambdaFunction>,
    pub rds: ServiceInventory<DatabaseInstance>,
    pub ecs: ServiceInventory<String>,
    pub elasticache: ServiceInventory<CacheCluster>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSummary {
    /// Number of resource kinds with at least one resource.
    pub total_services: usize,
}

/// Point-in-time view of an account, as given to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfrastructureSnapshot {
    pub timestamp: DateTime<Utc>,
    pub region: String,
    pub services: Services,
    pub summary: SnapshotSummary,
}

impl InfrastructureSnapshot {
    pub fn new(region: impl Into<String>, timestamp: DateTime<Utc>, services: Services) -> Self {
        let total_services = [
            services.ec2.count,
            services.lambda.count,
            services.rds.count,
            services.ecs.count,
            services.elasticache.count,
        ]
        .into_iter()
        .filter(|count| *count > 0)
        .count();

        Self {
            timestamp,
            region: region.into(),
            services,
            summary: SnapshotSummary { total_services },
        }
    }

    pub fn to_json(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// List every resource kind concurrently and assemble a snapshot.
///
/// A listing that fails is logged and treated as empty, so one unreachable
/// service does not hide the rest of the account. Only running instances are
/// kept.
pub async fn fetch_infrastructure<P>(provider: &P, region: &str) -> InfrastructureSnapshot
where
    P: CloudInventoryProvider + ?Sized,
{
    let (instances, functions, databases, clusters, caches) = futures::join!(
        provider.ec2_instances(),
        provider.lambda_functions(),
        provider.rds_instances(),
        provider.ecs_clusters(),
        provider.elasticache_clusters(),
    );

    let instances: Vec<_> = or_empty("ec2", instances)
        .into_iter()
        .filter(Ec2Instance::is_running)
        .collect();

    let services = Services {
        ec2: instances.into(),
        lambda: or_empty("lambda", functions).into(),
        rds: or_empty("rds", databases).into(),
        ecs: or_empty("ecs", clusters).into(),
        elasticache: or_empty("elasticache", caches).into(),
    };

    InfrastructureSnapshot::new(region, Utc::now(), services)
}

fn or_empty<T>(service: &str, result: Result<Vec<T>, ClientError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(service, error = %e, "inventory listing failed, reporting none");
        Vec::new()
    })
}

const REGION_NAMES: &[(&str, &str)] = &[
    ("us-east-1", "US East (N. Virginia)"),
    ("us-east-2", "US East (Ohio)"),
    ("us-west-1", "US West (N. California)"),
    ("us-west-2", "US West (Oregon)"),
    ("af-south-1", "Africa (Cape Town)"),
    ("ap-east-1", "Asia Pacific (Hong Kong)"),
    ("ap-south-1", "Asia Pacific (Mumbai)"),
    ("ap-northeast-1", "Asia Pacific (Tokyo)"),
    ("ap-northeast-2", "Asia Pacific (Seoul)"),
    ("ap-northeast-3", "Asia Pacific (Osaka)"),
    ("ap-southeast-1", "Asia Pacific (Singapore)"),
    ("ap-southeast-2", "Asia Pacific (Sydney)"),
    ("ap-southeast-3", "Asia Pacific (Jakarta)"),
    ("ca-central-1", "Canada (Central)"),
    ("eu-central-1", "Europe (Frankfurt)"),
    ("eu-west-1", "Europe (Ireland)"),
    ("eu-west-2", "Europe (London)"),
    ("eu-west-3", "Europe (Paris)"),
    ("eu-north-1", "Europe (Stockholm)"),
    ("eu-south-1", "Europe (Milan)"),
    ("me-south-1", "Middle East (Bahrain)"),
    ("sa-east-1", "South America (São Paulo)"),
];

/// Human-readable name for a region code.
///
/// # Example
/// ```
/// use infrasight::inventory::region_display_name;
///
/// assert_eq!(region_display_name("eu-west-1"), Some("Europe (Ireland)"));
/// assert_eq!(region_display_name("mars-north-1"), None);
/// ```
pub fn region_display_name(code: &str) -> Option<&'static str> {
    REGION_NAMES
        .iter()
        .find(|(region, _)| *region == code)
        .map(|(_, name)| *name)
}

/// All known region codes, in display order.
pub fn known_regions() -> impl Iterator<Item = &'static str> {
    REGION_NAMES.iter().map(|(code, _)| *code)
}
