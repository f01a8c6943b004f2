pub mod constants;
pub mod fs_utils;
pub mod path_utils;

pub use constants::*;
pub use fs_utils::write_atomic;
pub use path_utils::{image_extension, relative_to, topic_dir, topic_slug};
