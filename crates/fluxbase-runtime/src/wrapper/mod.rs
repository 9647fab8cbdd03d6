mod imports;
mod template;

pub use template::CodeWrapper;
