pub mod blob_detector;
pub mod detection;
pub mod frame_source;
pub mod pattern_matcher;
pub mod pixel;
pub mod position_history;
pub mod presence;
pub mod signature;
