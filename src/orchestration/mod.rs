pub mod batch;
pub mod page_processor;

pub use self::batch::BatchRunner;
pub use self::page_processor::{PageProcessor, ProcessedPage};
