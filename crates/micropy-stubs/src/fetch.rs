//! Fetching and unpacking remote stub archives

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use micropy_fs::checksum;
use serde_json::Value;
use tempfile::TempDir;

use crate::{Error, Result};

const CHUNK_SIZE: usize = 16 * 1024;

/// Receives byte counts while a download streams.
pub trait Progress {
    fn update(&mut self, transferred: u64, total: Option<u64>);

    fn finish(&mut self) {}
}

/// Discards progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _transferred: u64, _total: Option<u64>) {}
}

impl<F: FnMut(u64, Option<u64>)> Progress for F {
    fn update(&mut self, transferred: u64, total: Option<u64>) {
        self(transferred, total)
    }
}

/// Whether `location` is an http(s) URL.
pub fn is_url(location: &str) -> bool {
    url::Url::parse(location)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Whether `location` names a gzipped tarball.
pub fn is_archive(location: &str) -> bool {
    let lower = location.to_lowercase();
    lower.ends_with(".tar.gz") || lower.ends_with(".tgz")
}

fn client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| Error::transport("<client>", e))
}

/// Download `url` into memory, reporting progress per chunk.
pub fn download(url: &str, progress: &mut dyn Progress) -> Result<Vec<u8>> {
    let mut response = client()?
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::transport(url, e))?;

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let read = response
            .read(&mut chunk)
            .map_err(|e| Error::transport(url, e))?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
        progress.update(body.len() as u64, total);
    }
    progress.finish();
    Ok(body)
}

/// Fetch and parse a JSON document.
pub fn fetch_json(url: &str) -> Result<Value> {
    let bytes = download(url, &mut NoProgress)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::transport(url, e))
}

/// Fail unless `bytes` hash to `expected`.
pub fn verify(url: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = checksum::compute_bytes_checksum(bytes);
    if checksum::matches(expected, &actual) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Unpack a gzipped tarball into `dest`.
pub fn extract_tar_gz(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    archive.unpack(dest).map_err(|e| Error::Archive {
        message: e.to_string(),
    })
}

/// If `dir` holds exactly one entry and it is a directory, that directory.
pub fn unwrap_single_dir(dir: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| micropy_fs::Error::io(dir, e))?
        .filter_map(|e| e.ok())
        .collect();
    match entries.as_slice() {
        [only] if only.path().is_dir() => Ok(only.path()),
        _ => Ok(dir.to_path_buf()),
    }
}

/// An unpacked archive. The temporary directory is removed on drop,
/// whether or not installation succeeded.
#[derive(Debug)]
pub struct Unpacked {
    _guard: TempDir,
    root: PathBuf,
}

impl Unpacked {
    /// Extract `bytes` into a fresh temporary directory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let guard = TempDir::new().map_err(|e| micropy_fs::Error::io(std::env::temp_dir(), e))?;
        extract_tar_gz(bytes, guard.path())?;
        let root = unwrap_single_dir(guard.path())?;
        Ok(Self {
            _guard: guard,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micropy_test_utils::archive::tar_gz;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/a.tar.gz", true)]
    #[case("http://example.com/a", true)]
    #[case("/home/user/stubs", false)]
    #[case("esp32-micropython", false)]
    #[case("C:/stubs/esp32", false)]
    fn test_is_url(#[case] location: &str, #[case] expected: bool) {
        assert_eq!(is_url(location), expected);
    }

    #[test]
    fn test_unpacked_unwraps_single_directory() {
        let bytes = tar_gz(&[("pkg-1.0/info.json", "{}"), ("pkg-1.0/stubs/machine.py", "")]);
        let unpacked = Unpacked::from_bytes(&bytes).unwrap();
        assert!(unpacked.root().ends_with("pkg-1.0"));
        assert!(unpacked.root().join("info.json").is_file());
    }

    #[test]
    fn test_temp_dir_removed_on_drop() {
        let bytes = tar_gz(&[("info.json", "{}")]);
        let unpacked = Unpacked::from_bytes(&bytes).unwrap();
        let root = unpacked.root().to_path_buf();
        drop(unpacked);
        assert!(!root.exists());
    }

    #[test]
    fn test_verify_checksum() {
        let digest = checksum::compute_bytes_checksum(b"abc");
        assert!(verify("u", b"abc", &digest).is_ok());
        assert!(matches!(
            verify("u", b"abd", &digest),
            Err(Error::ChecksumMismatch { .. })
        ));
    }
}
