pub mod activity;
pub mod desktops;
pub mod relocation;
pub mod server;

pub use activity::ActivityTable;
pub use desktops::DesktopRegistry;
pub use relocation::{
    PatternMatcher, PendingRelocation, PlaceholderMatcher, RelocationStep, RelocationTracker,
    TriggerSighting,
};
