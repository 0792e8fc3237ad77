use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Object store on the local filesystem: `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(key);
        // 不允許跳出根目錄
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(EtlError::storage(
                key,
                format!("invalid object path '{}'", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        tracing::debug!("Reading local object {}", path.display());

        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EtlError::storage(key, "object not found"),
            ErrorKind::PermissionDenied => EtlError::storage(key, "permission denied"),
            _ => EtlError::storage(key, e.to_string()),
        })
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_root = self.object_path(bucket, "")?;
        if !bucket_root.is_dir() {
            return Err(EtlError::storage(bucket, "bucket not found"));
        }

        let mut keys = Vec::new();
        collect_keys(&bucket_root, &bucket_root, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

fn collect_keys(base: &Path, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_keys(base, &path, keys)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
    }
    Ok(())
}
