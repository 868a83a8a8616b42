pub mod system;
pub mod tracing;

pub use system::BackofficeSystem;
pub use self::tracing::setup_tracing;
