use crate::error::{TowerError, TowerResult};
use crate::history::TowerHistory;
use crate::metrics::TowerMetrics;
use chaoschain_core::app_config::TowerConfig;
use chaoschain_core::mock::{MockLogisticsFeed, MockSocialMonitor, MockSupplierFeed, MockWeatherFeed};
use chaoschain_core::signals::{
    LogisticsFeed, RouteSignal, SignalSnapshot, SignalStatus, SocialMonitor, SupplierFeed,
    SupplierSignal, WeatherFeed, WeatherSeverity, WeatherSignal,
};
use chaoschain_core::{Category, CoreError};
use chaoschain_forecast::{AnomalyDetector, RiskEngine, ZScoreAnomalyDetector};
use chaoschain_inventory::{Clock, InventoryLedger};
use chaoschain_planner::ActionPlanner;
use chaoschain_shared::models::events::CycleCompletedEvent;
use chaoschain_shared::MonitoringResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Lead times draw from a stream separate from the demand models
const LEAD_TIME_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// External signal providers consulted once per location per cycle
#[derive(Clone)]
pub struct Collaborators {
    pub social: Arc<dyn SocialMonitor>,
    pub weather: Arc<dyn WeatherFeed>,
    pub logistics: Arc<dyn LogisticsFeed>,
    pub supplier: Arc<dyn SupplierFeed>,
}

impl Collaborators {
    pub fn mocks() -> Self {
        Self {
            social: Arc::new(MockSocialMonitor::default()),
            weather: Arc::new(MockWeatherFeed),
            logistics: Arc::new(MockLogisticsFeed),
            supplier: Arc::new(MockSupplierFeed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationFailure {
    pub location: String,
    pub reason: String,
}

/// Outcome of one fork-join cycle across all locations
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub results: Vec<MonitoringResult>,
    pub failures: Vec<LocationFailure>,
    pub cancelled: Vec<String>,
}

impl CycleReport {
    pub fn to_event(&self) -> CycleCompletedEvent {
        CycleCompletedEvent {
            cycle_id: uuid::Uuid::new_v4(),
            cycle: self.cycle,
            timestamp: chrono::Utc::now().timestamp(),
            results: self.results.clone(),
            failed_locations: self
                .failures
                .iter()
                .map(|f| f.location.clone())
                .chain(self.cancelled.iter().cloned())
                .collect(),
        }
    }
}

enum WorkerOutcome {
    Completed(TowerResult<MonitoringResult>),
    Cancelled,
}

/// Runs the demand → risk → replenishment loop for every location
pub struct ControlTower {
    categories: Vec<Category>,
    locations: Vec<String>,
    ledger: Arc<InventoryLedger>,
    engine: Arc<RiskEngine>,
    planner: Arc<ActionPlanner>,
    collaborators: Collaborators,
    history: TowerHistory,
    metrics: TowerMetrics,
    anomaly: Option<Arc<dyn AnomalyDetector>>,
    cycles: AtomicU64,
    shutdown_requested: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl ControlTower {
    pub fn from_config(
        config: &TowerConfig,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> TowerResult<Self> {
        config.validate()?;
        let sim = &config.simulation;
        let categories = config.categories();

        let mut lead_rng = match sim.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ LEAD_TIME_SEED_SALT),
            None => StdRng::from_entropy(),
        };
        let lead_times: HashMap<Category, u32> = categories
            .iter()
            .map(|c| (c.clone(), lead_rng.gen_range(sim.min_lead_time..=sim.max_lead_time)))
            .collect();

        let cycle_ms = i64::try_from(sim.cycle_duration_ms)
            .map_err(|_| CoreError::ConfigError(format!("cycle_duration_ms {} is out of range", sim.cycle_duration_ms)))?;
        let ledger = Arc::new(InventoryLedger::new(
            sim.initial_on_hand,
            lead_times,
            chrono::Duration::milliseconds(cycle_ms),
            clock,
        ));
        let engine = Arc::new(RiskEngine::new(&categories, &config.forecast, sim.seed)?);
        let planner = Arc::new(ActionPlanner::new(ledger.clone(), config.planner.clone()));

        let anomaly: Option<Arc<dyn AnomalyDetector>> = if config.anomaly.enabled {
            Some(Arc::new(ZScoreAnomalyDetector {
                threshold: config.anomaly.threshold,
            }))
        } else {
            None
        };

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(
            categories = categories.len(),
            locations = sim.locations.len(),
            seeded = sim.seed.is_some(),
            "Control tower initialised"
        );

        Ok(Self {
            categories,
            locations: sim.locations.clone(),
            ledger,
            engine,
            planner,
            collaborators,
            history: TowerHistory::new(&config.history),
            metrics: TowerMetrics::new()?,
            anomaly,
            cycles: AtomicU64::new(0),
            shutdown_requested: AtomicBool::new(false),
            shutdown_tx,
        })
    }

    /// Swap in a custom detector; `None` disables the check
    pub fn with_anomaly_detector(mut self, detector: Option<Arc<dyn AnomalyDetector>>) -> Self {
        self.anomaly = detector;
        self
    }

    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        &self.ledger
    }

    pub fn engine(&self) -> &Arc<RiskEngine> {
        &self.engine
    }

    pub fn planner(&self) -> &Arc<ActionPlanner> {
        &self.planner
    }

    pub fn history(&self) -> &TowerHistory {
        &self.history
    }

    pub fn metrics(&self) -> &TowerMetrics {
        &self.metrics
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Ask in-flight and future workers to stop at their next checkpoint
    pub fn signal_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Run every location concurrently and wait for all of them.
    ///
    /// A failing or panicking location is reported in the cycle report and
    /// does not affect the others.
    pub async fn run_cycle(self: &Arc<Self>) -> CycleReport {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let handles: Vec<_> = self
            .locations
            .iter()
            .cloned()
            .map(|location| {
                let tower = Arc::clone(self);
                let mut shutdown = self.shutdown_tx.subscribe();
                tokio::spawn(async move {
                    if tower.shutdown_requested.load(Ordering::SeqCst) {
                        return WorkerOutcome::Cancelled;
                    }
                    tokio::select! {
                        result = tower.monitor_location(&location) => WorkerOutcome::Completed(result),
                        _ = shutdown.recv() => WorkerOutcome::Cancelled,
                    }
                })
            })
            .collect();

        let joined = futures_util::future::join_all(handles).await;

        let mut report = CycleReport {
            cycle,
            results: Vec::with_capacity(self.locations.len()),
            failures: Vec::new(),
            cancelled: Vec::new(),
        };

        for (location, outcome) in self.locations.iter().zip(joined) {
            match outcome {
                Ok(WorkerOutcome::Completed(Ok(result))) => {
                    self.metrics.record_result(&result);
                    report.results.push(result);
                }
                Ok(WorkerOutcome::Completed(Err(e))) => {
                    error!(location = %location, error = %e, "Location worker failed");
                    self.metrics.record_failure(location);
                    report.failures.push(LocationFailure {
                        location: location.clone(),
                        reason: e.to_string(),
                    });
                }
                Ok(WorkerOutcome::Cancelled) => {
                    warn!(location = %location, "Location worker cancelled");
                    self.metrics.record_failure(location);
                    report.cancelled.push(location.clone());
                }
                Err(join_error) => {
                    let failure = TowerError::Worker {
                        location: location.clone(),
                        reason: join_error.to_string(),
                    };
                    error!(error = %failure, "Location worker aborted");
                    self.metrics.record_failure(location);
                    report.failures.push(LocationFailure {
                        location: location.clone(),
                        reason: failure.to_string(),
                    });
                }
            }
        }

        self.metrics.cycles_completed.inc();
        report
    }

    /// One monitoring pass for a single location
    pub async fn monitor_location(&self, location: &str) -> TowerResult<MonitoringResult> {
        let received = self.ledger.receive_due_shipments();
        if received > 0 {
            debug!(location = %location, received, "Shipments received");
        }

        let signals = self.gather_signals(location).await;
        debug!(
            location = %location,
            weather = ?signals.weather.severity,
            route = ?signals.route.status,
            supplier = ?signals.supplier.status,
            "Signals gathered"
        );

        let mut risks = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            let available = self.ledger.available(category.as_str())?;
            let factor = signals.social_factor(category);
            risks.push(self.engine.assess_demand(category.as_str(), available, factor)?);
            // Cancellation checkpoint
            tokio::task::yield_now().await;
        }

        let actions = self.planner.plan(&risks);

        let mut entries = Vec::with_capacity(risks.len());
        for (category, risk) in self.categories.iter().zip(&risks) {
            let inventory = self.ledger.available(category.as_str())?;
            self.check_anomaly(location, category, risk.score);
            entries.push((category.clone(), inventory, risk.score));
        }
        self.history.record(location, &entries);
        self.history.raise_alerts(location, &risks);

        info!(
            location = %location,
            risks = risks.len(),
            actions = actions.len(),
            "Location monitored"
        );

        Ok(MonitoringResult {
            location: location.to_string(),
            risks,
            actions,
        })
    }

    /// Failed fetches degrade to neutral values
    async fn gather_signals(&self, location: &str) -> SignalSnapshot {
        let social = match self.collaborators.social.analyze(&self.categories).await {
            Ok(mut social) => {
                social.retain(|category, signal| {
                    let usable = signal.factor.is_finite() && signal.factor >= 0.0;
                    if !usable {
                        warn!(location = %location, category = %category, factor = signal.factor, "Discarding invalid social factor");
                    }
                    usable
                });
                social
            }
            Err(e) => {
                warn!(location = %location, error = %e, "Social signal unavailable, using neutral factor");
                HashMap::new()
            }
        };

        let weather = match self.collaborators.weather.forecast().await {
            Ok(weather) => weather,
            Err(e) => {
                warn!(location = %location, error = %e, "Weather signal unavailable");
                WeatherSignal { severity: WeatherSeverity::Unknown }
            }
        };

        let route = match self.collaborators.logistics.route_status(location).await {
            Ok(route) => route,
            Err(e) => {
                warn!(location = %location, error = %e, "Route status unavailable");
                RouteSignal { status: SignalStatus::Unknown }
            }
        };

        let supplier = match self.collaborators.supplier.assess(location).await {
            Ok(supplier) => supplier,
            Err(e) => {
                warn!(location = %location, error = %e, "Supplier status unavailable");
                SupplierSignal { status: SignalStatus::Unknown }
            }
        };

        SignalSnapshot {
            social,
            weather,
            route,
            supplier,
        }
    }

    fn check_anomaly(&self, location: &str, category: &Category, score: f64) {
        let Some(detector) = &self.anomaly else {
            return;
        };
        let series = self.history.risk_series(location, category);
        if detector.detect(score, &series) {
            warn!(
                location = %location,
                category = %category,
                score,
                history = series.len(),
                "Anomalous risk score"
            );
        }
    }
}
