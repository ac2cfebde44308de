pub mod driver;

pub use driver::{Driver, PageSource, TaskArgs};
