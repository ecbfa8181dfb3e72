//! Command implementations for filerec

pub mod dispatch;
pub mod extract;
pub mod inputs;
pub mod keywords;
pub mod run;
