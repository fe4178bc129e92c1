// Inline script cache: content-addressed files under a cache directory
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

use lacquer_core::domain::Runtime;

/// Writes inline script bodies to disk once, keyed by their sha256
pub struct ScriptCache {
    dir: PathBuf,
}

impl ScriptCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file name: `script_<name>_<sha256[..8]>.<ext>`
    pub fn file_name(name: &str, body: &str, runtime: Runtime) -> String {
        let digest = hex::encode(Sha256::digest(body.as_bytes()));
        format!(
            "script_{}_{}.{}",
            sanitize(name),
            &digest[..8],
            runtime.extension()
        )
    }

    /// Path of the cached script, writing it first if missing
    pub async fn get_or_write(
        &self,
        name: &str,
        body: &str,
        runtime: Runtime,
    ) -> std::io::Result<PathBuf> {
        let path = self.dir.join(Self::file_name(name, body, runtime));

        if tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "Script cache hit");
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, body).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).await?;
        }

        debug!(path = %path.display(), "Script cached");
        Ok(path)
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "inline".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_ok, block_on};

    #[test]
    fn test_file_name_is_content_addressed() {
        let a = ScriptCache::file_name("step one", "print(1)", Runtime::Python);
        let b = ScriptCache::file_name("step one", "print(2)", Runtime::Python);

        assert!(a.starts_with("script_step_one_"));
        assert!(a.ends_with(".py"));
        assert_ne!(a, b);
        assert_eq!(a, ScriptCache::file_name("step one", "print(1)", Runtime::Python));
    }

    #[test]
    fn test_empty_name() {
        assert!(ScriptCache::file_name("", "x", Runtime::Bash).starts_with("script_inline_"));
    }

    #[test]
    fn test_get_or_write_reuses_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScriptCache::new(dir.path().join("scripts"));

        let first = assert_ok!(block_on(cache.get_or_write("echo", "echo hi", Runtime::Bash)));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "echo hi");

        let second = assert_ok!(block_on(cache.get_or_write("echo", "echo hi", Runtime::Bash)));
        assert_eq!(first, second);
        assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 1);
    }
}
