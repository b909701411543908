use chaoschain_shared::{Action, MonitoringResult};
use prometheus::{Counter, CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// Prometheus instruments for the control loop
pub struct TowerMetrics {
    registry: Registry,

    pub cycles_completed: Counter,
    pub orders_placed: CounterVec,
    pub units_ordered: CounterVec,
    pub risk_score: GaugeVec,
    pub worker_failures: CounterVec,
}

impl TowerMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_completed = Counter::new("chaoschain_cycles_completed_total", "Monitoring cycles completed")?;
        let orders_placed = CounterVec::new(
            Opts::new("chaoschain_orders_placed_total", "Replenishment orders placed"),
            &["category"],
        )?;
        let units_ordered = CounterVec::new(
            Opts::new("chaoschain_units_ordered_total", "Units requested by replenishment orders"),
            &["category"],
        )?;
        let risk_score = GaugeVec::new(
            Opts::new("chaoschain_risk_score", "Latest risk score (0-1)"),
            &["location", "target"],
        )?;
        let worker_failures = CounterVec::new(
            Opts::new("chaoschain_worker_failures_total", "Location workers that failed or were cancelled"),
            &["location"],
        )?;

        registry.register(Box::new(cycles_completed.clone()))?;
        registry.register(Box::new(orders_placed.clone()))?;
        registry.register(Box::new(units_ordered.clone()))?;
        registry.register(Box::new(risk_score.clone()))?;
        registry.register(Box::new(worker_failures.clone()))?;

        Ok(Self {
            registry,
            cycles_completed,
            orders_placed,
            units_ordered,
            risk_score,
            worker_failures,
        })
    }

    pub fn record_result(&self, result: &MonitoringResult) {
        for risk in &result.risks {
            self.risk_score
                .with_label_values(&[result.location.as_str(), risk.target.as_str()])
                .set(risk.score);
        }
        for action in &result.actions {
            if let Action::Order { category, quantity } = action {
                self.orders_placed.with_label_values(&[category.as_str()]).inc();
                self.units_ordered
                    .with_label_values(&[category.as_str()])
                    .inc_by(*quantity as f64);
            }
        }
    }

    pub fn record_failure(&self, location: &str) {
        self.worker_failures.with_label_values(&[location]).inc();
    }

    /// Text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
