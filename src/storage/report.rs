use super::record::Record;

/// Aggregate value of everything in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// Σ wholesale cost × quantity
    pub wholesale: f64,
    /// Σ retail cost × quantity
    pub retail: f64,
    /// Wide enough that no number of stored `i64` quantities can overflow it
    pub quantity: i128,
}

impl Totals {
    pub fn add(&mut self, record: &Record) {
        self.wholesale += record.wholesale_value();
        self.retail += record.retail_value();
        self.quantity += i128::from(record.quantity);
    }
}
