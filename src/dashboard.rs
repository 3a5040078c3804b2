//! Cost dashboard widgets and optimization recommendations.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::inventory::{CloudInventoryProvider, CostPeriod, Ec2Instance};

/// How far back the cost figure looks.
pub const COST_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    CostOptimization,
    Governance,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub service: String,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    /// Estimated saving, when one can be given.
    pub potential_savings: Option<String>,
}

/// A single headline number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
    pub subtitle: String,
}

impl MetricCard {
    fn new(title: &str, value: String, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            value,
            subtitle: subtitle.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub monthly_cost: f64,
    pub ec2_instances: Vec<Ec2Instance>,
    pub costs: Vec<CostPeriod>,
    pub recommendations: Vec<Recommendation>,
}

impl Dashboard {
    pub fn new(instances: Vec<Ec2Instance>, costs: Vec<CostPeriod>) -> Self {
        let monthly_cost = costs.first().map(|period| period.amount).unwrap_or(0.0);
        let recommendations = recommendations(&instances);
        Self {
            monthly_cost,
            ec2_instances: instances,
            costs,
            recommendations,
        }
    }

    /// Monthly cost, instance count and number of recommended actions.
    pub fn metric_cards(&self) -> [MetricCard; 3] {
        [
            MetricCard::new(
                "Monthly Cost",
                format!("${:.2}", self.monthly_cost),
                "Current month spend",
            ),
            MetricCard::new(
                "EC2 Instances",
                self.ec2_instances.len().to_string(),
                "Running instances",
            ),
            MetricCard::new(
                "Optimization Actions",
                self.recommendations.len().to_string(),
                "Recommended actions",
            ),
        ]
    }
}

/// Load instances and the trailing cost window ending at `today`.
pub async fn build_dashboard<P>(provider: &P, today: NaiveDate) -> Result<Dashboard, ClientError>
where
    P: CloudInventoryProvider + ?Sized,
{
    let start = today
        .checked_sub_days(Days::new(COST_WINDOW_DAYS))
        .ok_or_else(|| ClientError::InvalidRequest(format!("no cost window before {}", today)))?;

    let (instances, costs) =
        futures::try_join!(provider.ec2_instances(), provider.cost_and_usage(start, today))?;

    Ok(Dashboard::new(instances, costs))
}

/// Heuristic suggestions per instance.
///
/// Burstable `t3.` and general purpose `m5.` instances are flagged for
/// rightsizing; untagged instances are flagged for governance.
pub fn recommendations(instances: &[Ec2Instance]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for instance in instances {
        if instance.instance_type.starts_with("t3.") || instance.instance_type.starts_with("m5.") {
            recommendations.push(Recommendation {
                kind: RecommendationKind::CostOptimization,
                service: "EC2".to_string(),
                priority: Priority::Medium,
                title: format!("Consider rightsizing instance {}", instance.id),
                description: "Instance might be oversized based on type. Monitor CPU/memory usage to optimize size.".to_string(),
                potential_savings: Some("20-30%".to_string()),
            });
        }

        if instance.tags.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Governance,
                service: "EC2".to_string(),
                priority: Priority::High,
                title: format!("Missing tags on instance {}", instance.id),
                description: "Add tags for better cost allocation and resource management".to_string(),
                potential_savings: None,
            });
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{instance, FakeCloud};

    fn period(amount: f64) -> CostPeriod {
        CostPeriod {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            amount,
            unit: "USD".to_string(),
        }
    }

    #[test]
    fn test_recommendations() {
        let instances = vec![
            instance("i-1", "t3.medium", "running", &[("Name", "api")]),
            instance("i-2", "c6g.large", "running", &[]),
            instance("i-3", "m5.xlarge", "stopped", &[]),
            instance("i-4", "c6g.large", "running", &[("team", "infra")]),
        ];

        let recs = recommendations(&instances);
        let titles: Vec<_> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Consider rightsizing instance i-1",
                "Missing tags on instance i-2",
                "Consider rightsizing instance i-3",
                "Missing tags on instance i-3",
            ]
        );
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].potential_savings.as_deref(), Some("20-30%"));
        assert_eq!(recs[1].kind, RecommendationKind::Governance);
        assert_eq!(recs[1].priority, Priority::High);
        assert_eq!(recs[1].potential_savings, None);
    }

    #[test]
    fn test_metric_cards() {
        let dashboard = Dashboard::new(
            vec![instance("i-1", "t3.small", "running", &[])],
            vec![period(1234.5), period(99.0)],
        );

        let [cost, instances, actions] = dashboard.metric_cards();
        assert_eq!(cost.value, "$1234.50");
        assert_eq!(cost.subtitle, "Current month spend");
        assert_eq!(instances.value, "1");
        assert_eq!(actions.value, "2");
    }

    #[test]
    fn test_missing_cost_is_zero() {
        let dashboard = Dashboard::new(Vec::new(), Vec::new());
        assert_eq!(dashboard.monthly_cost, 0.0);
        assert_eq!(dashboard.metric_cards()[0].value, "$0.00");
    }

    #[tokio::test]
    async fn test_build_dashboard() {
        let cloud = FakeCloud {
            instances: vec![instance("i-1", "m5.large", "running", &[("Name", "db")])],
            costs: vec![period(42.0)],
            ..FakeCloud::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let dashboard = build_dashboard(&cloud, today).await.unwrap();
        assert_eq!(dashboard.monthly_cost, 42.0);
        assert_eq!(dashboard.ec2_instances[0].id, "i-1");
        assert_eq!(dashboard.recommendations.len(), 1);

        let json = serde_json::to_value(&dashboard).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["costs", "ec2_instances", "monthly_cost", "recommendations"]);
    }

    #[tokio::test]
    async fn test_build_dashboard_fails_with_cost_listing() {
        let cloud = FakeCloud {
            failing: vec!["cost"],
            ..FakeCloud::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let err = build_dashboard(&cloud, today).await.unwrap_err();
        assert!(matches!(err, ClientError::Provider(_)));
    }
}
