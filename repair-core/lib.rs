use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod chars;
pub mod pairs;
pub mod scan;
pub mod token;

pub type Tendril = SmartString<LazyCompact>;
