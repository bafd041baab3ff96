//! Template source adapters.

mod local;

pub use local::LocalTemplateSource;
