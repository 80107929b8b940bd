//! Boundary types and traits for the host windowing system.
//!
//! Everything in here is implemented by the platform glue; the rest of the
//! crate only talks to the host through these traits.

pub mod desktop;
pub mod hotkey;
pub mod window;
