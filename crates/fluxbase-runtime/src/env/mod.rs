mod builder;

pub use builder::EnvBuilder;
