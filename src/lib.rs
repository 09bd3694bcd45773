//! A Rust library for fitting and applying color correction matrices to
//! camera RGB responses.
//!
//! `ccmfit` measures how a camera's raw RGB response diverges from a
//! reference color target (a physical color checker, or custom reference
//! colors) and fits a correction matrix that minimizes that divergence under
//! a chosen perceptual distance metric.
//!
//! # Quick Start
//!
//! ```
//! use ccmfit::{
//!   ccm::{CCMModel, CcmOptions},
//!   checker::BuiltinChecker,
//!   space::rgb,
//! };
//!
//! // RGB triplets as measured off a physical color checker, in [0, 1].
//! let measured = vec![[0.36, 0.13, 0.12]; 24];
//! let mut reference = BuiltinChecker::MacbethD65_2.color();
//!
//! let model = CCMModel::fit(&measured, &mut reference, rgb::SRGB, &CcmOptions::new())?;
//! let corrected = model.infer(&measured, false);
//! # let _ = corrected;
//! # Ok::<(), ccmfit::Error>(())
//! ```
//!
//! # Architecture
//!
//! Colors flow through a small set of cooperating pieces:
//!
//! - [`io`] — illuminant/observer pairs and their whitepoints
//! - [`space`] — the registry of named color spaces ([`space::SpaceRegistry`]) and their
//!   conversions
//! - [`chromatic_adaptation`] — whitepoint adaptation transforms and their precomputed cache
//! - [`color`] — batches of triplets tagged with the space they live in
//! - [`distance`] — perceptual color-difference metrics
//! - [`linearize`] — maps a calibration target's raw patches onto estimated linear RGB
//! - [`ccm`] — the solver that ties all of the above together
//!
//! # Logging
//!
//! This crate logs through the [`log`] facade at `debug` (registry and solver
//! bookkeeping) and `warn` (masked-out patches, fallback paths) levels. No
//! logging happens on the per-pixel [`ccm::CCMModel::infer`] path.

pub mod ccm;
pub mod checker;
pub mod chromatic_adaptation;
pub mod color;
pub mod distance;
mod error;
pub mod io;
mod linearize;
mod matrix;
mod operations;
mod polyfit;
mod simplex;
pub mod space;

pub use ccm::{CCMModel, CcmOptions};
pub use chromatic_adaptation::Cat;
pub use color::Color;
pub use distance::DistanceKind;
pub use error::{Error, Result};
pub use io::{Illuminant, Io, Observer};
pub use linearize::Linearizer;
pub use matrix::Matrix3;
pub use space::{SpaceKey, SpaceRegistry};
