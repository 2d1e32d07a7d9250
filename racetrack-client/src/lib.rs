//! HTTP transports for the Racetrack broadcast server.
//!
//! Both transports implement [`tak_sync::Transport`]: [`SseTransport`] follows
//! the live event stream, [`PollingTransport`] re-fetches full snapshots.
//!
//! # Example
//!
//! ```no_run
//! use racetrack_client::SseTransport;
//! use tak_sync::{Runner, SyncConfig};
//!
//! # fn collaborators() -> tak_sync::Collaborators { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = SseTransport::new("https://racetrack.mortenlohne.no/0/sse")?;
//!     let (_viewer_tx, viewer_rx) = tokio::sync::mpsc::channel(16);
//!     Runner::new(SyncConfig::default(), transport, collaborators())
//!         .run(viewer_rx, std::future::pending())
//!         .await;
//!     Ok(())
//! }
//! ```

mod decoder;
mod error;
mod poll;
mod sse;

pub use decoder::{SseDecoder, SseEvent};
pub use error::{ClientError, ClientResult};
pub use poll::{PollingTransport, DEFAULT_POLL_INTERVAL};
pub use sse::SseTransport;

use reqwest::Url;

/// Public broadcast of the first board.
pub const DEFAULT_URL: &str = "https://racetrack.mortenlohne.no/0/sse";

const USER_AGENT: &str = concat!("takwatch/", env!("CARGO_PKG_VERSION"));

fn parse_url(url: &str) -> ClientResult<Url> {
    let parsed = Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ClientError::InvalidUrl(format!(
            "{url}: unsupported scheme {scheme}"
        ))),
    }
}
