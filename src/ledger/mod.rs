pub mod mock;
pub mod noop;
pub mod variant;

pub use mock::{LedgerBehavior, MockLedger};
pub use noop::NoopLedger;
pub use variant::LedgerVariant;
