/// Platform-specific functionality: account-name lookup for entry owners.
pub mod owner;

pub use crate::model::UNKNOWN_OWNER;
pub use owner::OwnerResolver;
