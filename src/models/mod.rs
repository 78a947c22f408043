pub mod expense;
pub mod note;
pub mod receipt;

pub use expense::{ExpenseDocument, ExpenseField, LineItem, LineItemGroup};
pub use note::{Note, Record, Task};
pub use receipt::{
    ExtractedReceipt, NewReceipt, NewReceiptItem, Receipt, ReceiptItem, DEFAULT_STORE_ID,
};
