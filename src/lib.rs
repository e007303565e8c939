// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::missing_errors_doc,      // Internal API
    clippy::missing_panics_doc,      // Internal API
    clippy::module_name_repetitions, // e.g. TransportError in transport module
    clippy::must_use_candidate,      // Annotated selectively on critical APIs
    clippy::doc_markdown             // Internal API
)]

pub mod app;
pub mod builder;
pub mod domain;
pub mod sanitizer;
pub mod transport;

// Re-export main types for easy access
pub use app::{Config, ShipReport, Shipper, ShipperError};
pub use builder::DocumentBuilder;
pub use domain::{LogDocument, RawRecord};
pub use sanitizer::{KeySanitizer, SanitizingEncoder};
pub use transport::{DocumentTransport, IndexClient, TransportError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
