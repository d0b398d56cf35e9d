use smartstring::{LazyCompact, SmartString};

pub mod buffer;
pub mod config;
pub mod host;
pub mod rewriter;
pub mod table;
pub mod tracking;

pub type Tendril = SmartString<LazyCompact>;
