pub mod magnet_partition;
pub mod realtime_event;
