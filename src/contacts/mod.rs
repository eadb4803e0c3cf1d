//! Contacts and the storage collaborator the approval workflow reads from and
//! writes to.

mod model;
mod store;

pub use model::{Contact, ContactId, ContactStatus, NewContact};
pub use store::{ContactStore, FileContactStore, SharedContactStore};
