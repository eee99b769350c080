mod resize_operation;

pub use resize_operation::ResizeOperation;
