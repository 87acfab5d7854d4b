use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{KvError, KvResult};
use crate::traits::ByteStore;

/// File-per-key byte store.
///
/// Every value lives in `<dir>/.<hex(key)>.data`. Writes go to a temporary
/// file in the same directory which is then renamed over the target, so a
/// reader sees either the old value or the new one, never a partial file.
/// Overwrites are last-write-wins.
#[derive(Clone, Debug)]
pub struct FileByteStore {
    dir: PathBuf,
}

impl FileByteStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> KvResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &[u8]) -> PathBuf {
        self.dir.join(format!(".{}.data", hex::encode(key)))
    }
}

fn write_replacing(dir: &Path, target: &Path, value: &[u8]) -> io::Result<bool> {
    let existed = target.exists();
    let mut temp = tempfile::Builder::new().prefix("put-").tempfile_in(dir)?;
    temp.write_all(value)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(!existed)
}

#[async_trait]
impl ByteStore for FileByteStore {
    async fn get(&self, key: &[u8]) -> KvResult<Vec<u8>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                trace!(path = %path.display(), len = data.len(), "read value");
                Ok(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(KvError::NotFound(key.to_vec())),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        let dir = self.dir.clone();
        let target = self.path_for(key);
        let value = value.to_vec();
        let created = tokio::task::spawn_blocking(move || write_replacing(&dir, &target, &value))
            .await
            .map_err(io::Error::other)??;
        debug!(key = %hex::encode(key), created, "stored value");
        Ok(())
    }
}
