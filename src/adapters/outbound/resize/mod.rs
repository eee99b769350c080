pub mod convert_command;
pub mod image_resizer;

pub use convert_command::{ConvertCommandResizer, DEFAULT_CONVERT_PROGRAM};
pub use image_resizer::ImageCrateResizer;
