mod bill;
mod category;
mod id;

pub use bill::{Bill, BillKind, ParsedBill, Platform};
pub use category::Category;
pub use id::Id;
