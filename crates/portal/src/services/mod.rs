pub mod volume_service;

pub use volume_service::VolumeService;
