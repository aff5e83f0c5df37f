use crate::reference::AssetHandle;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// Looks up external assets during a bake. `None` means the asset is missing.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, path: &str, sub_name: Option<&str>) -> Option<AssetHandle>;
}

/// Resolves nothing, every asset reference stays unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _path: &str, _sub_name: Option<&str>) -> Option<AssetHandle> {
        None
    }
}

/// Explicitly registered assets and their named sub-items.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    assets: HashMap<String, BTreeSet<String>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, sub_names: &[&str]) -> Self {
        self.register(path, sub_names);
        self
    }

    pub fn register(&mut self, path: &str, sub_names: &[&str]) {
        self.assets.entry(path.to_string()).or_default().extend(sub_names.iter().map(|s| s.to_string()));
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for MemoryAssets {
    fn resolve(&self, path: &str, sub_name: Option<&str>) -> Option<AssetHandle> {
        let subs = self.assets.get(path)?;
        if let Some(sub) = sub_name {
            if !subs.contains(sub) {
                return None;
            }
        }
        Some(AssetHandle { path: path.to_string(), sub_name: sub_name.map(str::to_string), location: format!("memory://{path}") })
    }
}

/// Assets as files under a root directory. A sub-item of a directory asset is a file in it with that stem;
/// sub-items of file assets are not inspected.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryAssets { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl AssetResolver for DirectoryAssets {
    fn resolve(&self, path: &str, sub_name: Option<&str>) -> Option<AssetHandle> {
        if path.is_empty() || path.split(['/', '\\']).any(|part| part == "..") {
            return None;
        }
        let full = self.root.join(path);
        let location = match sub_name {
            None if full.is_file() => full,
            Some(_) if full.is_file() => full,
            Some(sub) if full.is_dir() => std::fs::read_dir(&full)
                .ok()?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .find(|p| p.is_file() && p.file_stem().is_some_and(|stem| stem == sub))?,
            _ => return None,
        };
        Some(AssetHandle { path: path.to_string(), sub_name: sub_name.map(str::to_string), location: location.display().to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_assets_check_sub_names() {
        let assets = MemoryAssets::new().with("icons/atlas.png", &["sword", "shield"]).with("sfx/hit.wav", &[]);
        assert!(assets.resolve("icons/atlas.png", Some("sword")).is_some());
        assert!(assets.resolve("icons/atlas.png", Some("bow")).is_none());
        assert!(assets.resolve("sfx/hit.wav", None).is_some());
        assert!(assets.resolve("sfx/miss.wav", None).is_none());
    }

    #[test]
    fn directory_assets_find_files() {
        let root = std::env::temp_dir().join("sheetbake").join(format!("assets_{}", rand::random::<u64>()));
        std::fs::create_dir_all(root.join("icons")).unwrap();
        std::fs::write(root.join("icons").join("sword.png"), b"png").unwrap();
        std::fs::write(root.join("hit.wav"), b"wav").unwrap();
        let assets = DirectoryAssets::new(&root);

        assert!(assets.resolve("hit.wav", None).is_some());
        assert!(assets.resolve("icons", Some("sword")).is_some());
        assert!(assets.resolve("icons", Some("bow")).is_none());
        assert!(assets.resolve("icons", None).is_none());
        assert!(assets.resolve("../hit.wav", None).is_none());
        std::fs::remove_dir_all(root).unwrap();
    }
}
