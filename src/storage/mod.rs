mod error;
pub mod record;
pub mod report;
pub mod store;

pub use error::{Error, Result};
pub use record::Record;
pub use report::Totals;
pub use store::{Records, Store, DEFAULT_STORE};
