use std::io::{self, Write};
use std::path::PathBuf;

use atomic_write_file::AtomicWriteFile;

/// Replace `path` with `contents` in one step. Readers see either the old or
/// the new file, never a partial write.
pub async fn write_atomic(path: PathBuf, contents: Vec<u8>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut file = AtomicWriteFile::open(&path)?;
        file.write_all(&contents)?;
        file.commit()
    })
    .await
    .map_err(io::Error::other)?
}
