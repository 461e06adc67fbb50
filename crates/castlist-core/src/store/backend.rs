//! Raw tenant-document storage.

use crate::{
    model::TenantId,
    store::{MAX_TENANT_DOCUMENT_BYTES, StoreError},
};
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::RwLock,
};

///
/// StoreBackend
///
/// Byte-level persistence for one JSON document per tenant. Backends never
/// interpret the bytes; decoding and bounds live in `RosterStore`.
///
/// Calls are synchronous. Async callers such as `DataAccess` run them
/// inline on the calling task.
///

pub trait StoreBackend: Send + Sync {
    /// Read the tenant document. `Ok(None)` means the tenant has no state.
    fn read(&self, tenant: &TenantId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the tenant document.
    fn write(&self, tenant: &TenantId, bytes: &[u8]) -> Result<(), StoreError>;
}

///
/// MemoryBackend
///

#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<TenantId, Vec<u8>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw bytes for a tenant, bypassing every shape check.
    pub fn insert_raw(&self, tenant: &TenantId, bytes: impl Into<Vec<u8>>) -> Result<(), StoreError> {
        self.documents
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(tenant.clone(), bytes.into());

        Ok(())
    }
}

impl StoreBackend for MemoryBackend {
    fn read(&self, tenant: &TenantId) -> Result<Option<Vec<u8>>, StoreError> {
        let documents = self.documents.read().map_err(|_| StoreError::Poisoned)?;

        Ok(documents.get(tenant).cloned())
    }

    fn write(&self, tenant: &TenantId, bytes: &[u8]) -> Result<(), StoreError> {
        self.insert_raw(tenant, bytes)
    }
}

///
/// FileBackend
///
/// One `<root>/<tenant>.json` file per tenant. Writes go through a sibling
/// temp file and a rename so readers never observe a half-written document.
///
/// I/O is blocking `std::fs`, bounded by `MAX_TENANT_DOCUMENT_BYTES` per
/// call. Inside an async runtime one load blocks its worker for a single
/// file read; hosts on a current-thread runtime that cannot afford that
/// should keep documents in `MemoryBackend` and persist out of band.
///

#[derive(Clone, Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // Tenant ids become file names, so only a conservative charset passes.
    fn document_path(&self, tenant: &TenantId) -> Result<PathBuf, StoreError> {
        let valid = !tenant.is_empty()
            && tenant
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Invalid {
                message: format!("tenant id '{tenant}' is not a valid file name"),
            });
        }

        Ok(self.root.join(format!("{tenant}.json")))
    }
}

impl StoreBackend for FileBackend {
    fn read(&self, tenant: &TenantId) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.document_path(tenant)?;
        let io_err = |source| StoreError::Io {
            tenant: tenant.to_string(),
            source,
        };

        let len = match fs::metadata(&path) {
            Ok(meta) => usize::try_from(meta.len()).unwrap_or(usize::MAX),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(err)),
        };
        if len > MAX_TENANT_DOCUMENT_BYTES {
            return Err(StoreError::TooLarge {
                len,
                max: MAX_TENANT_DOCUMENT_BYTES,
            });
        }

        fs::read(&path).map(Some).map_err(io_err)
    }

    fn write(&self, tenant: &TenantId, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.document_path(tenant)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            tenant: tenant.to_string(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(io_err)?;
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }
}
