//! HTTP API handlers for deepsecure-dash

pub mod files;
pub mod health;
pub mod previews;
pub mod samples;
pub mod sse;
pub mod track;
pub mod ui;

pub use files::file_routes;
pub use health::health_routes;
pub use previews::preview_routes;
pub use samples::sample_routes;
pub use sse::event_stream;
pub use track::track_routes;
pub use ui::ui_routes;
