//! 기본 값 타입.

pub mod month;

pub use month::*;
