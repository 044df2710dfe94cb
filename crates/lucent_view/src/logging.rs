//! Log output for hosts and demos
//!
//! Lucent itself only emits `tracing` events. Hosts that don't install their
//! own subscriber can call [`init`] once at startup; `RUST_LOG` overrides the
//! default filter.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Install a formatting subscriber, ignoring an already-installed one
pub fn init() {
    if try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

/// Install a formatting subscriber
pub fn try_init() -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish()
        .try_init()
}
