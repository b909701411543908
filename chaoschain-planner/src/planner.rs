use chaoschain_core::app_config::PlannerConfig;
use chaoschain_inventory::InventoryLedger;
use chaoschain_shared::{Action, RiskAssessment, RiskKind, RiskLevel};
use parking_lot::Mutex;
use std::sync::Arc;

/// Turns risk assessments into replenishment orders or mitigation records
pub struct ActionPlanner {
    ledger: Arc<InventoryLedger>,
    config: PlannerConfig,
    /// Every action ever emitted, in emission order
    history: Mutex<Vec<Action>>,
}

impl ActionPlanner {
    pub fn new(ledger: Arc<InventoryLedger>, config: PlannerConfig) -> Self {
        Self {
            ledger,
            config,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Plan a batch of assessments, placing orders on the ledger as a side effect
    pub fn plan(&self, assessments: &[RiskAssessment]) -> Vec<Action> {
        let actions: Vec<Action> = assessments
            .iter()
            .filter_map(|assessment| match assessment.kind {
                RiskKind::Demand => self.plan_replenishment(assessment),
                // No score or level gate on these paths
                RiskKind::Weather | RiskKind::Logistics | RiskKind::Supplier => {
                    Some(Action::mitigation(assessment.kind, &assessment.target))
                }
            })
            .collect();

        self.history.lock().extend(actions.iter().cloned());
        actions
    }

    fn plan_replenishment(&self, assessment: &RiskAssessment) -> Option<Action> {
        let category = assessment.target.as_str();

        let available = match self.ledger.available(category) {
            Ok(available) => available,
            Err(e) => {
                tracing::error!(category = %category, error = %e, "Cannot plan replenishment");
                return None;
            }
        };

        let quantity = self.order_quantity(assessment.forecast, available);
        if quantity == 0 || assessment.level < RiskLevel::Medium {
            return None;
        }

        let Ok(delta) = i64::try_from(quantity) else {
            tracing::error!(category = %category, quantity, "Replenishment quantity out of range");
            return None;
        };

        let placed = self
            .ledger
            .lead_time(category)
            .and_then(|lead_time| self.ledger.adjust(category, delta, lead_time));
        if let Err(e) = placed {
            tracing::error!(category = %category, quantity, error = %e, "Replenishment order failed");
            return None;
        }

        tracing::info!(
            category = %category,
            quantity,
            available,
            level = ?assessment.level,
            score = assessment.score,
            "Replenishment order placed"
        );

        Some(Action::Order {
            category: category.to_string(),
            quantity,
        })
    }

    /// Units needed to lift availability to the safety stock level
    pub fn order_quantity(&self, forecast: Option<f64>, available: u64) -> u64 {
        let safety_stock = match forecast {
            Some(f) if f > 0.0 => f * self.config.safety_factor,
            _ => self.config.fallback_safety_stock,
        };
        // Ties go to the even integer
        let shortfall = (safety_stock - available as f64).round_ties_even();
        if shortfall > 0.0 {
            shortfall as u64
        } else {
            0
        }
    }

    pub fn action_history(&self) -> Vec<Action> {
        self.history.lock().clone()
    }

    pub fn action_count(&self) -> usize {
        self.history.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaoschain_inventory::ManualClock;
    use chaoschain_shared::Category;
    use chrono::Duration;
    use std::collections::HashMap;

    fn setup() -> (Arc<InventoryLedger>, ActionPlanner) {
        let lead_times = HashMap::from([
            (Category::from("electronics"), 2),
            (Category::from("food"), 1),
        ]);
        let ledger = Arc::new(InventoryLedger::new(
            1200,
            lead_times,
            Duration::milliseconds(300),
            Arc::new(ManualClock::default()),
        ));
        let planner = ActionPlanner::new(ledger.clone(), PlannerConfig::default());
        (ledger, planner)
    }

    #[test]
    fn test_high_demand_risk_places_order() {
        let (ledger, planner) = setup();
        let risk = RiskAssessment::demand("electronics", RiskLevel::High, 0.72, 1000.0);

        let actions = planner.plan(&[risk]);

        assert_eq!(
            actions,
            vec![Action::Order {
                category: "electronics".to_string(),
                quantity: 100,
            }]
        );
        let record = ledger.record("electronics").unwrap();
        assert_eq!(record.in_transit, 100);
        assert_eq!(record.on_hand, 1200);
        assert_eq!(ledger.pending_orders().len(), 1);
    }

    #[test]
    fn test_no_order_when_stock_covers_safety_level() {
        let (ledger, planner) = setup();
        let risk = RiskAssessment::demand("food", RiskLevel::High, 0.65, 900.0);

        assert!(planner.plan(&[risk]).is_empty());
        assert_eq!(ledger.record("food").unwrap().in_transit, 0);
    }

    #[test]
    fn test_low_level_is_not_acted_on() {
        let (ledger, planner) = setup();
        let risk = RiskAssessment::demand("electronics", RiskLevel::Low, 0.1, 5000.0);

        assert!(planner.plan(&[risk]).is_empty());
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_fallback_safety_stock() {
        let (_, planner) = setup();
        assert_eq!(planner.order_quantity(None, 200), 300);
        assert_eq!(planner.order_quantity(Some(0.0), 200), 300);
        assert_eq!(planner.order_quantity(None, 1200), 0);
    }

    #[test]
    fn test_order_quantity_rounding() {
        let (_, planner) = setup();
        // 1000.5 * 1.3 = 1300.65
        assert_eq!(planner.order_quantity(Some(1000.5), 1200), 101);
        assert_eq!(planner.order_quantity(Some(10.0), 0), 13);
    }

    #[test]
    fn test_weather_risk_always_mitigated() {
        let (ledger, planner) = setup();
        for level in [RiskLevel::Low, RiskLevel::Critical] {
            let risk = RiskAssessment::signal(RiskKind::Weather, "Asia", level, 0.0);
            let actions = planner.plan(&[risk]);

            assert_eq!(actions.len(), 1);
            assert!(matches!(
                &actions[0],
                Action::Mitigation { kind: RiskKind::Weather, target, .. } if target == "Asia"
            ));
        }
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_history_is_append_only() {
        let (_, planner) = setup();
        planner.plan(&[RiskAssessment::signal(RiskKind::Supplier, "Europe", RiskLevel::Medium, 0.5)]);
        planner.plan(&[
            RiskAssessment::signal(RiskKind::Logistics, "Europe", RiskLevel::High, 0.9),
            RiskAssessment::demand("electronics", RiskLevel::Medium, 0.5, 1000.0),
        ]);

        let history = planner.action_history();
        assert_eq!(history.len(), 3);
        assert!(matches!(history[0], Action::Mitigation { kind: RiskKind::Supplier, .. }));
        assert!(history[2].is_order());
        assert_eq!(planner.action_count(), 3);
    }

    #[test]
    fn test_oversized_shortfall_is_not_ordered() {
        let (ledger, planner) = setup();
        let risk = RiskAssessment::demand("electronics", RiskLevel::High, 0.9, 1e19);

        assert!(planner.plan(&[risk]).is_empty());
        assert_eq!(planner.action_count(), 0);
        let record = ledger.record("electronics").unwrap();
        assert_eq!(record.on_hand, 1200);
        assert_eq!(record.in_transit, 0);
        assert!(ledger.pending_orders().is_empty());

        let risk = RiskAssessment::demand("food", RiskLevel::High, 0.9, f64::INFINITY);
        assert!(planner.plan(&[risk]).is_empty());
        assert_eq!(ledger.record("food").unwrap().on_hand, 1200);
    }

    #[test]
    fn test_unknown_category_is_skipped() {
        let (_, planner) = setup();
        let risk = RiskAssessment::demand("toys", RiskLevel::High, 0.9, 1000.0);
        assert!(planner.plan(&[risk]).is_empty());
        assert_eq!(planner.action_count(), 0);
    }
}
