use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const DEFAULT_FILTER: &str = "gridswitch=info";

/// Installs the global subscriber. Handler spans nest, so the tree layer
/// shows which notification a provider call or state change belongs to.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let tree = HierarchicalLayer::default()
        .with_indent_amount(2)
        .with_indent_lines(true)
        .with_targets(true)
        .with_timer(tracing_tree::time::Uptime::default());

    if Registry::default().with(filter).with(tree).try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
