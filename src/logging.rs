use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::fmt;

/// INFO by default, DEBUG with `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise logging: {}", err))
}
