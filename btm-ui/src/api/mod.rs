//! HTTP API handlers for btm-ui

pub mod buildinfo;
pub mod companies;
pub mod health;
pub mod registry;
pub mod ui;

pub use buildinfo::{get_build_info, BuildInfo};
pub use companies::{demo_companies, export_demo, export_uploaded, uploaded_companies};
pub use health::health_routes;
pub use registry::{refresh_registry, registry_status};
pub use ui::{serve_app_js, serve_index};
