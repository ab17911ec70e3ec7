mod repl;
mod storage;

pub use repl::*;
pub use storage::{Error, Record, Records, Result, Store, Totals, DEFAULT_STORE};
