//! Gesture-driven 3D transform control.
//!
//! This crate turns a stream of hand landmarks (as produced by a hand landmark network) into
//! smoothed changes to the position, rotation and scale of a 3D object. Hand poses select what the
//! palm's motion does:
//!
//! 1. [`features`] computes the palm center and how curled each finger is.
//! 2. [`classifier`] scores the finger curls against a [`Catalogue`] of gesture templates.
//! 3. [`debounce`] only confirms a gesture once it has been recognized for a settling delay.
//! 4. [`transform`] applies the confirmed gesture's action to a [`RenderTarget`], moving it by a
//!    smoothed fraction of the palm's motion.
//!
//! [`Controller`] runs these steps once per [`Tick`].
//!
//! # Coordinates
//!
//! Landmark X and Y are in pixel coordinates of the camera frame, with Y pointing *down*. Moving
//! the hand up thus produces a negative Y delta, which the controller maps to positive rotation
//! around X, upward panning and growing scale.
//!
//! [`Catalogue`]: classifier::Catalogue
//! [`RenderTarget`]: transform::RenderTarget
//! [`Controller`]: controller::Controller
//! [`Tick`]: timer::Tick

use log::LevelFilter;

pub mod classifier;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod features;
pub mod filter;
pub mod landmark;
pub mod synthetic;
pub mod timer;
pub mod transform;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and this crate will log at *trace*
/// level. Otherwise, they will log at *debug* level. `RUST_LOG` overrides both.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
