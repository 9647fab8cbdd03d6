mod bucket;

pub use bucket::KeyedLimiter;
