use anyhow::Result;
use async_trait::async_trait;

/// File access used by ingestion and export.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;
    async fn exists(&self, path: &str) -> Result<bool>;
    /// Entries directly under `prefix`, or `prefix` itself when it is a file.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for NativeStorage {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = std::path::Path::new(prefix);
        let mut entries = Vec::new();

        if tokio::fs::try_exists(path).await? {
            if path.is_dir() {
                let mut dir = tokio::fs::read_dir(path).await?;
                while let Some(entry) = dir.next_entry().await? {
                    entries.push(entry.path().to_string_lossy().to_string());
                }
            } else {
                entries.push(prefix.to_string());
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a").join("b").join("out.csv");
        let path_str = path.to_str().unwrap();

        let storage = NativeStorage::new();
        assert!(!storage.exists(path_str).await?);
        storage.write(path_str, "场次\n".as_bytes()).await?;
        assert!(storage.exists(path_str).await?);
        assert_eq!(storage.read(path_str).await?, "场次\n".as_bytes());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("nope");
        let storage = NativeStorage::new();
        assert!(storage.list(missing.to_str().unwrap()).await?.is_empty());

        std::fs::write(dir.path().join("x.txt"), "x")?;
        let listed = storage.list(dir.path().to_str().unwrap()).await?;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].ends_with("x.txt"));
        Ok(())
    }
}
