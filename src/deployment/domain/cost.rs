//! Monthly cost estimates.

use super::DeploymentName;
use serde::Serialize;
use std::collections::BTreeMap;

/// Currency used for all estimates.
pub const CURRENCY: &str = "USD";

/// Itemised monthly cost estimate for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    deployment_name: DeploymentName,
    total_cost_per_month: f64,
    breakdown: BTreeMap<String, f64>,
    currency: &'static str,
}

impl CostEstimate {
    /// Creates an empty estimate.
    #[must_use]
    pub const fn new(deployment_name: DeploymentName) -> Self {
        Self {
            deployment_name,
            total_cost_per_month: 0.0,
            breakdown: BTreeMap::new(),
            currency: CURRENCY,
        }
    }

    /// Adds a line item and recomputes the rounded total.
    #[must_use]
    pub fn with_item(mut self, service: impl Into<String>, monthly_cost: f64) -> Self {
        self.breakdown.insert(service.into(), monthly_cost);
        self.total_cost_per_month = round_to_cents(self.breakdown.values().sum());
        self
    }

    /// Returns the deployment the estimate belongs to.
    #[must_use]
    pub const fn deployment_name(&self) -> &DeploymentName {
        &self.deployment_name
    }

    /// Returns the total rounded to cents.
    #[must_use]
    pub const fn total_cost_per_month(&self) -> f64 {
        self.total_cost_per_month
    }

    /// Returns the unrounded line items keyed by service.
    #[must_use]
    pub const fn breakdown(&self) -> &BTreeMap<String, f64> {
        &self.breakdown
    }
}

/// Rounds a dollar amount to two decimal places.
#[expect(
    clippy::float_arithmetic,
    reason = "currency amounts are reported as rounded floating-point dollars"
)]
#[must_use]
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(8.47, 8.47)]
    #[case(0.033, 0.03)]
    #[case(1.005_1, 1.01)]
    #[case(0.0, 0.0)]
    fn rounds_to_two_decimals(#[case] amount: f64, #[case] expected: f64) {
        assert!((round_to_cents(amount) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn total_sums_all_items() {
        let estimate = CostEstimate::new(DeploymentName::new("shop").expect("valid name"))
            .with_item("ec2", 8.47)
            .with_item("s3", 0.033);

        assert!((estimate.total_cost_per_month() - 8.5).abs() < f64::EPSILON);
        assert_eq!(estimate.breakdown().len(), 2);
    }
}
