use chaoschain_core::app_config::TowerConfig;
use chaoschain_inventory::SystemClock;
use chaoschain_shared::models::events::InventorySnapshotEvent;
use chaoschain_tower::{Collaborators, ControlTower};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chaoschain_tower=info,chaoschain_planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TowerConfig::load()?;
    let cycles = config.simulation.cycles;
    let pause = Duration::from_millis(config.simulation.cycle_duration_ms);
    tracing::info!(cycles, locations = ?config.simulation.locations, "Starting control tower");

    let tower = Arc::new(ControlTower::from_config(
        &config,
        Collaborators::mocks(),
        Arc::new(SystemClock),
    )?);

    let ctrl_c_tower = tower.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling in-flight workers");
            ctrl_c_tower.signal_shutdown();
        }
    });

    for _ in 0..cycles {
        let report = tower.run_cycle().await;
        let event = report.to_event();
        tracing::info!(
            cycle = report.cycle,
            completed = report.results.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled.len(),
            payload = %serde_json::to_string(&event)?,
            "Cycle completed"
        );

        if !report.cancelled.is_empty() {
            break;
        }
        // Let in-transit orders progress towards arrival between cycles
        tokio::time::sleep(pause).await;
    }

    let ledger = tower.ledger();
    let snapshot = InventorySnapshotEvent {
        timestamp: chrono::Utc::now().timestamp(),
        on_hand: ledger
            .snapshot()
            .into_iter()
            .map(|(category, on_hand)| (category.to_string(), on_hand))
            .collect(),
        pending_orders: ledger.pending_orders().len(),
    };
    tracing::info!(
        actions = tower.planner().action_count(),
        alerts = tower.history().alerts().len(),
        snapshot = %serde_json::to_string(&snapshot)?,
        "Run finished"
    );
    tracing::debug!(metrics = %tower.metrics().render(), "Final metrics");

    Ok(())
}
