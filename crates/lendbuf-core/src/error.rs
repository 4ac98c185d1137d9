use thiserror::Error;

/// Canonical result for the pool crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the pool can report, across all layers.
///
/// The first three variants are configuration-time failures; the middle group
/// covers admission (nothing is allocated and no counter moves when these are
/// returned); the last group covers the release protocol and misuse of a
/// handle after release.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("pool has not been configured")]
    NotConfigured,

    #[error("pool is already configured")]
    AlreadyConfigured,

    #[error("request of {requested} bytes exceeds the per-request ceiling of {max_request} bytes")]
    RequestTooLarge { requested: u64, max_request: u64 },

    #[error(
        "budget exhausted: requested {requested} bytes with {outstanding} of {capacity} outstanding"
    )]
    BudgetExhausted {
        requested: u64,
        outstanding: u64,
        capacity: u64,
    },

    #[error("requested sizes overflow the addressable range")]
    SizeOverflow,

    #[error("host allocation failed for {bytes} bytes")]
    AllocFailed { bytes: u64 },

    #[error("release accounting failed: {0}")]
    ReleaseAccounting(String),

    #[error("entry has already been released")]
    AlreadyReleased,

    #[error("segment index {index} out of range for entry with {count} segments")]
    SegmentOutOfRange { index: usize, count: usize },

    #[error("unknown entry handle {0}")]
    InvalidHandle(u64),
}

impl Error {
    /// True for the admission-rejection variants, which by contract leave the
    /// outstanding counter and the host allocator untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::RequestTooLarge { .. } | Error::BudgetExhausted { .. } | Error::SizeOverflow
        )
    }
}
