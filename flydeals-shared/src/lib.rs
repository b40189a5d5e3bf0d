pub mod email;
pub mod pii;

pub use email::normalize_email;
pub use pii::Masked;
