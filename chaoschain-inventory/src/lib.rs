pub mod clock;
pub mod ledger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{InventoryLedger, InventoryRecord, LedgerError, ReplenishmentOrder};
