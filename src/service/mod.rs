pub mod extractor;
pub mod images;
pub mod memory_store;
pub mod normalize;
pub mod ocr;
pub mod receipts;

pub use images::ImageStore;
pub use memory_store::MemoryStore;
pub use ocr::{OcrService, SessionCache};
pub use receipts::ReceiptService;
