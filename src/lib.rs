//! # qrsize
//!
//! A Rust library that chooses the parameters of a QR code before its data is laid out.
//!
//! `qrsize` classifies text into the numeric, alphanumeric or byte data mode, selects the smallest
//! QR Code Model 2 version (1 to 40) that can hold it at error correction level L, and computes
//! the symbol's side length in modules. The geometry can then be handed to a renderer that writes
//! a placeholder PNG of that size.
//!
//! ## Features
//!
//! - Mode classification with compile-time character tables.
//! - Version selection over a process-wide, read-only capacity table.
//! - Placeholder PNG rendering into any [`std::io::Write`] sink, with sink errors returned as-is.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Example
//!
//! ```rust
//! use qrsize::{analyze, generate, Mode};
//!
//! let analysis = analyze("555-2368").unwrap();
//! assert_eq!(analysis.mode, Mode::Alphanumeric);
//! assert_eq!(analysis.pattern_size(), 21);
//!
//! let mut png = Vec::new();
//! generate(&mut png, "555-2368", analysis.version).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: Mode classification, capacities and version selection.
//! - [`helper`]: Placeholder rendering.

pub mod qrcode;
pub mod helper;

pub use helper::{
    generate, generate_with, placeholder_image_buffer, render_placeholder, render_placeholder_with,
    RenderConfig,
};
pub use qrcode::{
    analyze, capacity, classify, pattern_size, select_version, Analysis, Mode, QrError, Version,
};
