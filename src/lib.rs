pub mod config;
pub mod db;
pub mod directory; // Case & user collaborators
pub mod facets; // Faceted filter engine
pub mod models;
pub mod panel; // Integration surface
pub mod publisher;
pub mod results;

use tracing_subscriber::EnvFilter;

pub use facets::{recompute, EngineInput, FacetCatalog, FacetValue, FacetView, SelectionState};
pub use panel::{FilterPanel, PanelError, SharedFilterPanel};
pub use publisher::{ChannelSubscriber, FilterChange, FilterPublisher, FilterSubscriber};

/// Install the fmt subscriber, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialised", config::APP_NAME, config::APP_VERSION);
    }
}
