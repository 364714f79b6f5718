pub mod gold;
pub mod scanner;
pub mod silver;
pub mod storage;

pub use gold::GoldProcessor;
pub use scanner::{ExtensionMap, find_missing, list_tier, scan_missing};
pub use silver::SilverProcessor;
