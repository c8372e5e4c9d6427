pub mod mock;
pub mod noop;
pub mod variant;

pub use mock::MockTransport;
pub use noop::NoopTransport;
pub use variant::TransportVariant;
