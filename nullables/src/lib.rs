//! Nullable infrastructure for deterministic testing.
//!
//! Every external seam of the issuance service (clock, code generation,
//! storage, verification gate, delivery) has a test-friendly
//! implementation here that:
//! - Returns deterministic values
//! - Can be controlled programmatically while the code under test runs
//! - Never touches the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod codes;
pub mod delivery;
pub mod gate;
pub mod store;

pub use clock::NullClock;
pub use codes::NullCodeGenerator;
pub use delivery::NullDelivery;
pub use gate::NullGate;
pub use store::NullStore;
