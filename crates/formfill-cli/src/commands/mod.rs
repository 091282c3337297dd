pub mod completion;
pub mod fill;
pub mod interpret;
pub mod serve;
