pub mod image_detection;

pub use image_detection::{format_bytes, is_image_file};
