//! Well-known local validator endpoints and ledger directory allocation

use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// JSON RPC endpoint of a validator running on the loopback interface
pub const LOCALHOST: &str = "http://127.0.0.1:8899";

/// Pubsub endpoint of a validator running on the loopback interface
pub const LOCALHOST_WS: &str = "ws://127.0.0.1:8900";

/// Prefix of every ledger directory handed out by [`tmp_ledger_dir`]
pub const LEDGER_DIR_PREFIX: &str = "amman-ledger-";

/// Render an endpoint the way it is written in configuration files.
///
/// `Url` normalizes `http://127.0.0.1:8899` to `http://127.0.0.1:8899/`; the
/// bare root path is dropped again so exported endpoints match [`LOCALHOST`].
pub fn endpoint_str(url: &Url) -> &str {
    let full = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        full.strip_suffix('/').unwrap_or(full)
    } else {
        full
    }
}

/// Allocate a fresh, writable ledger directory under the system temp dir.
///
/// The directory is created exclusively, so concurrent runs on the same machine
/// never share a ledger. It is not removed on drop: the validator owns it.
pub fn tmp_ledger_dir() -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(LEDGER_DIR_PREFIX)
        .tempdir()?
        .keep();

    debug!(ledger_dir = %dir.display(), "Allocated ledger directory");
    Ok(dir)
}
