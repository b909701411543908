use crate::models::actions::MonitoringResult;
use std::collections::BTreeMap;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CycleCompletedEvent {
    pub cycle_id: uuid::Uuid,
    pub cycle: u64,
    pub timestamp: i64,
    pub results: Vec<MonitoringResult>,
    pub failed_locations: Vec<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct InventorySnapshotEvent {
    pub timestamp: i64,
    pub on_hand: BTreeMap<String, u64>,
    pub pending_orders: usize,
}
