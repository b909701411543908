use crate::clock::Clock;
use chaoschain_shared::Category;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// Stock position for one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryRecord {
    pub on_hand: u64,
    /// Sum of outstanding order quantities
    pub in_transit: u64,
    /// Replenishment lead time in simulated cycles
    pub lead_time: u32,
}

impl InventoryRecord {
    pub fn available(&self) -> u64 {
        self.on_hand + self.in_transit
    }
}

/// Outstanding replenishment order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentOrder {
    pub id: Uuid,
    pub category: Category,
    pub quantity: u64,
    pub placed_at: DateTime<Utc>,
    pub expected_arrival: DateTime<Utc>,
}

#[derive(Default)]
struct LedgerState {
    records: HashMap<Category, InventoryRecord>,
    orders: Vec<ReplenishmentOrder>,
}

/// Shared per-category stock ledger.
///
/// Every operation takes the same lock, so a shipment receipt can never
/// observe a half-applied adjustment.
pub struct InventoryLedger {
    state: Mutex<LedgerState>,
    cycle_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl InventoryLedger {
    /// Create a ledger with `initial_on_hand` units per category
    pub fn new(
        initial_on_hand: u64,
        lead_times: HashMap<Category, u32>,
        cycle_duration: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let records = lead_times
            .into_iter()
            .map(|(category, lead_time)| {
                (
                    category,
                    InventoryRecord {
                        on_hand: initial_on_hand,
                        in_transit: 0,
                        lead_time,
                    },
                )
            })
            .collect();

        Self {
            state: Mutex::new(LedgerState {
                records,
                orders: Vec::new(),
            }),
            cycle_duration,
            clock,
        }
    }

    /// Place an order (`delta > 0`) or consume stock (`delta <= 0`).
    ///
    /// Consumption is floored at zero on hand. An order whose arrival time
    /// cannot be represented is rejected without touching the record.
    pub fn adjust(&self, category: &str, delta: i64, lead_time_cycles: u32) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let record = state
            .records
            .get_mut(category)
            .ok_or_else(|| LedgerError::UnknownCategory(category.to_string()))?;

        if delta > 0 {
            let expected_arrival = i32::try_from(lead_time_cycles)
                .ok()
                .and_then(|cycles| self.cycle_duration.checked_mul(cycles))
                .and_then(|wait| now.checked_add_signed(wait))
                .ok_or(LedgerError::LeadTimeOverflow(lead_time_cycles))?;
            let quantity = delta.unsigned_abs();
            record.in_transit = record
                .in_transit
                .checked_add(quantity)
                .ok_or_else(|| LedgerError::QuantityOverflow(category.to_string()))?;
            let order = ReplenishmentOrder {
                id: Uuid::new_v4(),
                category: Category::from(category),
                quantity,
                placed_at: now,
                expected_arrival,
            };
            tracing::debug!(
                order_id = %order.id,
                category = %category,
                quantity,
                expected_arrival = %order.expected_arrival,
                "Replenishment order registered"
            );
            state.orders.push(order);
        } else {
            record.on_hand = record.on_hand.saturating_sub(delta.unsigned_abs());
        }

        Ok(())
    }

    /// Move every order that has arrived from in-transit to on-hand.
    ///
    /// Returns how many orders were received.
    pub fn receive_due_shipments(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.orders)
            .into_iter()
            .partition(|order| order.expected_arrival <= now);
        state.orders = pending;

        for order in &due {
            if let Some(record) = state.records.get_mut(&order.category) {
                record.on_hand += order.quantity;
                record.in_transit = record.in_transit.saturating_sub(order.quantity);
            }
        }

        if !due.is_empty() {
            tracing::debug!(received = due.len(), pending = state.orders.len(), "Shipments received");
        }
        due.len()
    }

    /// On hand plus in transit
    pub fn available(&self, category: &str) -> Result<u64, LedgerError> {
        self.state
            .lock()
            .records
            .get(category)
            .map(InventoryRecord::available)
            .ok_or_else(|| LedgerError::UnknownCategory(category.to_string()))
    }

    pub fn lead_time(&self, category: &str) -> Result<u32, LedgerError> {
        self.state
            .lock()
            .records
            .get(category)
            .map(|r| r.lead_time)
            .ok_or_else(|| LedgerError::UnknownCategory(category.to_string()))
    }

    pub fn record(&self, category: &str) -> Option<InventoryRecord> {
        self.state.lock().records.get(category).cloned()
    }

    /// Copy of on-hand levels for every category
    pub fn snapshot(&self) -> BTreeMap<Category, u64> {
        self.state
            .lock()
            .records
            .iter()
            .map(|(category, record)| (category.clone(), record.on_hand))
            .collect()
    }

    pub fn pending_orders(&self) -> Vec<ReplenishmentOrder> {
        self.state.lock().orders.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Lead time of {0} cycles overflows the arrival time")]
    LeadTimeOverflow(u32),

    #[error("In-transit quantity overflow for {0}")]
    QuantityOverflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn ledger_with(clock: Arc<ManualClock>) -> InventoryLedger {
        let lead_times = HashMap::from([
            (Category::from("electronics"), 2),
            (Category::from("food"), 1),
        ]);
        InventoryLedger::new(1200, lead_times, Duration::milliseconds(300), clock)
    }

    fn assert_available_consistent(ledger: &InventoryLedger, category: &str) {
        let record = ledger.record(category).unwrap();
        assert_eq!(ledger.available(category).unwrap(), record.on_hand + record.in_transit);
    }

    #[test]
    fn test_order_lifecycle() {
        let clock = Arc::new(ManualClock::default());
        let ledger = ledger_with(clock.clone());

        // Place order, lead time 2 cycles
        ledger.adjust("electronics", 100, 2).unwrap();
        let record = ledger.record("electronics").unwrap();
        assert_eq!(record.on_hand, 1200);
        assert_eq!(record.in_transit, 100);
        assert_available_consistent(&ledger, "electronics");

        // One cycle in: not due yet
        clock.advance(Duration::milliseconds(300));
        assert_eq!(ledger.receive_due_shipments(), 0);
        assert_eq!(ledger.record("electronics").unwrap().in_transit, 100);

        // Two cycles in: received
        clock.advance(Duration::milliseconds(300));
        assert_eq!(ledger.receive_due_shipments(), 1);
        let record = ledger.record("electronics").unwrap();
        assert_eq!(record.on_hand, 1300);
        assert_eq!(record.in_transit, 0);
        assert!(ledger.pending_orders().is_empty());
        assert_available_consistent(&ledger, "electronics");
    }

    #[test]
    fn test_receive_is_idempotent() {
        let clock = Arc::new(ManualClock::default());
        let ledger = ledger_with(clock.clone());

        ledger.adjust("food", 40, 1).unwrap();
        clock.advance(Duration::seconds(1));
        ledger.receive_due_shipments();
        let first = ledger.record("food").unwrap();

        assert_eq!(ledger.receive_due_shipments(), 0);
        assert_eq!(ledger.record("food").unwrap(), first);
    }

    #[test]
    fn test_consumption_floors_at_zero() {
        let clock = Arc::new(ManualClock::default());
        let ledger = ledger_with(clock);

        ledger.adjust("food", -200, 1).unwrap();
        assert_eq!(ledger.record("food").unwrap().on_hand, 1000);

        ledger.adjust("food", -5000, 1).unwrap();
        assert_eq!(ledger.record("food").unwrap().on_hand, 0);
        assert_available_consistent(&ledger, "food");
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let ledger = ledger_with(Arc::new(ManualClock::default()));
        assert!(matches!(
            ledger.adjust("toys", 10, 1),
            Err(LedgerError::UnknownCategory(_))
        ));
        assert!(ledger.available("toys").is_err());
    }

    #[test]
    fn test_unrepresentable_lead_time_is_rejected() {
        let ledger = ledger_with(Arc::new(ManualClock::default()));

        assert!(matches!(
            ledger.adjust("food", 50, u32::MAX),
            Err(LedgerError::LeadTimeOverflow(u32::MAX))
        ));
        assert_eq!(ledger.receive_due_shipments(), 0);
        let record = ledger.record("food").unwrap();
        assert_eq!(record.on_hand, 1200);
        assert_eq!(record.in_transit, 0);
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_arrival_never_precedes_placement() {
        let ledger = ledger_with(Arc::new(ManualClock::default()));
        ledger.adjust("food", 50, i32::MAX as u32 / 1000).unwrap();

        let order = &ledger.pending_orders()[0];
        assert!(order.expected_arrival > order.placed_at);
        assert_eq!(ledger.receive_due_shipments(), 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let ledger = ledger_with(Arc::new(ManualClock::default()));
        let mut snapshot = ledger.snapshot();
        snapshot.insert(Category::from("food"), 0);

        assert_eq!(ledger.snapshot().get("food"), Some(&1200));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_concurrent_orders_keep_totals() {
        let clock = Arc::new(ManualClock::default());
        let ledger = Arc::new(ledger_with(clock.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        ledger.adjust("electronics", 3, 1).unwrap();
                        ledger.receive_due_shipments();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.record("electronics").unwrap().in_transit, 8 * 50 * 3);
        clock.advance(Duration::seconds(1));
        ledger.receive_due_shipments();
        let record = ledger.record("electronics").unwrap();
        assert_eq!(record.on_hand, 1200 + 8 * 50 * 3);
        assert_eq!(record.in_transit, 0);
    }
}
