pub mod geocode;
pub mod listing;
pub mod metadata;
pub mod pipeline;
pub mod post_fixes;
pub mod site;
pub mod wait_times;
