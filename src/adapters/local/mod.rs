pub mod json_line;

pub use json_line::JsonLineSource;
