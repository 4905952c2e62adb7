//! Image format converter - re-encodes batches of images between formats
//!
//! Each item carries an image either as a base64 JSON field or as a binary
//! attachment. Items are decoded, re-encoded into the requested format and
//! packaged back into the host's item shape, one item at a time, with an
//! optional collect-and-continue failure policy.

pub mod app;
pub mod batch;
pub mod error;
pub mod host;
pub mod image;
pub mod input;
pub mod models;
pub mod output;
pub mod settings;

pub use error::{Error, Result};
