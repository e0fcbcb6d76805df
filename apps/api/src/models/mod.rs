pub mod email;
pub mod format;
