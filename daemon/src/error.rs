use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Lmdb(#[from] cvup_store_lmdb::LmdbError),

    #[error("verification gate error: {0}")]
    Gate(#[from] cvup_verification::GateError),

    #[error("delivery error: {0}")]
    Delivery(#[from] cvup_delivery::DeliveryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
