//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod annotate;
pub mod health;

pub use annotate::{annotate, metadata, AnnotateParams};
pub use health::health_check;
