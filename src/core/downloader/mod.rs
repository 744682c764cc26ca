pub mod client;
pub mod error;
pub mod progress;
pub mod request;
pub mod transport;
pub mod trust;

pub use client::{Downloader, CHUNK_SIZE};
pub use error::{AttemptError, DownloadError};
pub use progress::{format_speed, ProgressCallback, ProgressEvent};
pub use request::{temp_path_for, RetryPolicy, TransferRequest};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportPool, TransportResponse};
pub use trust::{is_trusted_host, is_trusted_source, TRUSTED_HOSTS};
