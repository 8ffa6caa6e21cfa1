pub mod config;
pub mod logging;

pub mod checksum;
pub mod chunk;
pub mod error;
pub mod fetch;
pub mod http;
pub mod relay;
pub mod retry;
pub mod token;
pub mod upload;
pub mod url_model;

pub use error::RelayError;
pub use fetch::{fetch, FetchResult, Fetcher};
pub use relay::{drive_it, relay, RelayOptions, RelayOutcome};
pub use upload::{UploadDriver, UploadOutcome, UploadState, UploadedFile};
