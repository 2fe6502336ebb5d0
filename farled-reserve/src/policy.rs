use chrono::Duration;

/// Time windows for the two hold phases, plus sweep sizing. Session
/// timeout is a data-level deadline, not a process timer: these values
/// only decide how far out the deadline is written.
#[derive(Debug, Clone)]
pub struct HoldPolicy {
    /// How long a fresh hold may sit in data entry.
    pub data_entry_ttl: Duration,
    /// Extension granted when data entry completes and payment begins.
    pub payment_ttl: Duration,
    /// Max sessions reclaimed per sweep pass.
    pub sweep_batch: i64,
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self {
            data_entry_ttl: Duration::minutes(13),
            payment_ttl: Duration::minutes(8),
            sweep_batch: 100,
        }
    }
}
