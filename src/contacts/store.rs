use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::model::{Contact, ContactId, ContactStatus, NewContact};
use crate::error::StoreError;
use crate::storage::{read_snapshot, write_snapshot};
use crate::system_paths::contacts_path;

/// Storage collaborator for contacts: lookup, listing, creation and the
/// status update used by the approval workflow.
pub trait ContactStore: Send + Sync {
    fn get(&self, id: ContactId) -> Option<Contact>;
    fn list(&self) -> Vec<Contact>;
    /// Store a new contact owned by `owner_id` with status Submitted.
    fn insert(&self, new: NewContact, owner_id: &str) -> Result<Contact, StoreError>;
    /// Insert a contact with an explicit status (seeding).
    fn insert_with_status(&self, new: NewContact, owner_id: &str, status: ContactStatus) -> Result<Contact, StoreError>;
    fn update_status(&self, id: ContactId, status: ContactStatus) -> Result<Contact, StoreError>;
    fn is_empty(&self) -> bool { self.list().is_empty() }
}

pub type SharedContactStore = Arc<dyn ContactStore>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: ContactId,
    contacts: Vec<Contact>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: ContactId,
    contacts: BTreeMap<ContactId, Contact>,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot { next_id: self.next_id, contacts: self.contacts.values().cloned().collect() }
    }
}

/// Contacts held in memory and snapshotted to `contacts.json` on change.
pub struct FileContactStore {
    path: Option<PathBuf>,
    inner: RwLock<Inner>,
}

impl FileContactStore {
    pub fn open(data_root: &Path) -> Result<Self, StoreError> {
        let path = contacts_path(data_root);
        let snap: Snapshot = read_snapshot(&path)?.unwrap_or_default();
        let contacts: BTreeMap<ContactId, Contact> = snap.contacts.into_iter().map(|c| (c.contact_id, c)).collect();
        // Never reuse an id even if the snapshot's counter is stale
        let max_id = contacts.keys().next_back().copied().unwrap_or(0);
        let next_id = snap.next_id.max(max_id + 1).max(1);
        info!(target: "contactmgr::contacts", "contact store opened: path='{}' contacts={} next_id={}", path.display(), contacts.len(), next_id);
        Ok(Self { path: Some(path), inner: RwLock::new(Inner { next_id, contacts }) })
    }

    pub fn in_memory() -> Self {
        Self { path: None, inner: RwLock::new(Inner { next_id: 1, contacts: BTreeMap::new() }) }
    }

    fn persist(&self, inner: &Inner) -> Result<(), StoreError> {
        match &self.path {
            Some(p) => write_snapshot(p, &inner.snapshot()),
            None => Ok(()),
        }
    }
}

impl ContactStore for FileContactStore {
    fn get(&self, id: ContactId) -> Option<Contact> {
        self.inner.read().contacts.get(&id).cloned()
    }

    fn list(&self) -> Vec<Contact> {
        self.inner.read().contacts.values().cloned().collect()
    }

    fn insert(&self, new: NewContact, owner_id: &str) -> Result<Contact, StoreError> {
        self.insert_with_status(new, owner_id, ContactStatus::Submitted)
    }

    fn insert_with_status(&self, new: NewContact, owner_id: &str, status: ContactStatus) -> Result<Contact, StoreError> {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        let contact = new.into_contact(id, owner_id, status);
        inner.contacts.insert(id, contact.clone());
        inner.next_id = id + 1;
        if let Err(e) = self.persist(&inner) {
            inner.contacts.remove(&id);
            inner.next_id = id;
            return Err(e);
        }
        debug!(target: "contactmgr::contacts", "insert: id={} owner={} status={}", id, owner_id, status);
        Ok(contact)
    }

    fn update_status(&self, id: ContactId, status: ContactStatus) -> Result<Contact, StoreError> {
        let mut inner = self.inner.write();
        let Some(contact) = inner.contacts.get_mut(&id) else {
            return Err(StoreError::NotFound(format!("contact {}", id)));
        };
        let previous = contact.status;
        contact.status = status;
        let updated = contact.clone();
        if let Err(e) = self.persist(&inner) {
            if let Some(c) = inner.contacts.get_mut(&id) { c.status = previous; }
            return Err(e);
        }
        debug!(target: "contactmgr::contacts", "update_status: id={} {} -> {}", id, previous, status);
        Ok(updated)
    }

    fn is_empty(&self) -> bool {
        self.inner.read().contacts.is_empty()
    }
}
