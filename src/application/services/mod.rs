pub mod refresh_service;
pub mod timeline_service;

pub use refresh_service::RefreshService;
pub use timeline_service::TimelineService;
