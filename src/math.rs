pub mod triangle;
pub mod vertex;
pub mod viewport;
