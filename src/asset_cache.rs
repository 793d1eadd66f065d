//! Cache-then-network store for the shell's static assets.
//!
//! `install` pulls a fixed list of assets from the origin into the
//! `asset_cache` table. `fetch` answers from the cache when it can and falls
//! back to the origin otherwise; fallback responses are not cached.

use anyhow::{anyhow, Context};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

pub trait AssetFetcher {
    fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>>;
}

/// Serves assets from a directory on disk.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fetcher rooted at `origin_dir` under `workspace`. The directory must
    /// be relative and may not climb out of the workspace.
    pub fn within(workspace: &Path, origin_dir: &str) -> anyhow::Result<Self> {
        let dir = origin_dir.trim();
        if dir.is_empty() || !stays_inside(Path::new(dir)) {
            return Err(anyhow!(
                "origin directory must stay inside the workspace: {}",
                origin_dir
            ));
        }
        Ok(Self::new(workspace.join(dir)))
    }
}

impl AssetFetcher for DirFetcher {
    fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let file = self.root.join(path);
        std::fs::read(&file)
            .with_context(|| format!("failed to read asset {}", file.to_string_lossy()))
    }
}

/// Cache key for a request path: leading `./` and `/` are dropped and the
/// bare root maps to `index.html`. Parent-directory segments are rejected.
pub fn normalize_asset_path(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .trim_start_matches("./")
        .trim_start_matches('/');
    let key = if stripped.is_empty() || stripped == "." {
        "index.html"
    } else {
        stripped
    };
    if !stays_inside(Path::new(key)) {
        return Err(anyhow!("asset path must stay inside the origin: {}", raw));
    }
    Ok(key.to_string())
}

/// True when `path` has only plain segments: no root, prefix or `..`.
pub fn stays_inside(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub path: String,
    pub source: AssetSource,
    pub sha256: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAssetInfo {
    pub path: String,
    pub sha256: String,
    pub size: i64,
    pub cached_at: String,
}

pub struct AssetCache {
    conn: Rc<Connection>,
    name: String,
}

impl AssetCache {
    pub fn new(conn: Rc<Connection>, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetches every listed asset and stores it. All-or-nothing: if any
    /// asset fails, nothing from this install is kept.
    pub fn install(&self, files: &[String], fetcher: &dyn AssetFetcher) -> anyhow::Result<usize> {
        let mut fetched = Vec::with_capacity(files.len());
        for raw in files {
            let key = normalize_asset_path(raw)?;
            if fetched.iter().any(|(k, _): &(String, Vec<u8>)| *k == key) {
                continue;
            }
            let body = fetcher.fetch(&key)?;
            fetched.push((key, body));
        }

        let tx = self.conn.unchecked_transaction()?;
        for (key, body) in &fetched {
            tx.execute(
                "INSERT INTO asset_cache(cache_name, path, body, sha256, cached_at)
                 VALUES(?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
                 ON CONFLICT(cache_name, path) DO UPDATE SET
                   body = excluded.body,
                   sha256 = excluded.sha256,
                   cached_at = excluded.cached_at",
                (&self.name, key, body, sha256_hex(body)),
            )?;
        }
        tx.commit()?;
        info!(cache = %self.name, assets = fetched.len(), "asset cache installed");
        Ok(fetched.len())
    }

    pub fn lookup(&self, path: &str) -> anyhow::Result<Option<FetchedAsset>> {
        let key = normalize_asset_path(path)?;
        let row: Option<(Vec<u8>, String)> = self
            .conn
            .query_row(
                "SELECT body, sha256 FROM asset_cache WHERE cache_name = ? AND path = ?",
                (&self.name, &key),
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        Ok(row.map(|(body, sha256)| FetchedAsset {
            path: key,
            source: AssetSource::Cache,
            sha256,
            body,
        }))
    }

    pub fn fetch(&self, path: &str, fetcher: &dyn AssetFetcher) -> anyhow::Result<FetchedAsset> {
        if let Some(hit) = self.lookup(path)? {
            debug!(path = %hit.path, "asset served from cache");
            return Ok(hit);
        }
        let key = normalize_asset_path(path)?;
        let body = fetcher.fetch(&key)?;
        debug!(path = %key, "asset served from origin");
        Ok(FetchedAsset {
            sha256: sha256_hex(&body),
            path: key,
            source: AssetSource::Network,
            body,
        })
    }

    pub fn list(&self) -> anyhow::Result<Vec<CachedAssetInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, sha256, length(body), cached_at
             FROM asset_cache
             WHERE cache_name = ?
             ORDER BY path",
        )?;
        let rows = stmt
            .query_map([&self.name], |r| {
                Ok(CachedAssetInfo {
                    path: r.get(0)?,
                    sha256: r.get(1)?,
                    size: r.get(2)?,
                    cached_at: r.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapFetcher {
        files: HashMap<String, Vec<u8>>,
        calls: RefCell<Vec<String>>,
    }

    impl MapFetcher {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl AssetFetcher for MapFetcher {
        fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
            self.calls.borrow_mut().push(path.to_string());
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("404 {}", path))
        }
    }

    fn cache() -> AssetCache {
        let conn = Connection::open_in_memory().expect("open");
        crate::db::init_schema(&conn).expect("schema");
        AssetCache::new(Rc::new(conn), "outing-app")
    }

    #[test]
    fn normalizes_request_paths() {
        assert_eq!(normalize_asset_path("./").expect("root"), "index.html");
        assert_eq!(normalize_asset_path("/").expect("root"), "index.html");
        assert_eq!(normalize_asset_path("./script.js").expect("js"), "script.js");
        assert_eq!(normalize_asset_path("img/logo.png").expect("nested"), "img/logo.png");
        assert!(normalize_asset_path("../secret").is_err());
        assert!(normalize_asset_path("a/../../b").is_err());
    }

    #[test]
    fn origin_dir_must_stay_inside_workspace() {
        let ws = Path::new("/srv/outing");
        let fetcher = DirFetcher::within(ws, "app").expect("relative dir");
        assert_eq!(fetcher.root, ws.join("app"));
        assert!(DirFetcher::within(ws, "./shell/v2").is_ok());
        assert!(DirFetcher::within(ws, "/").is_err());
        assert!(DirFetcher::within(ws, "/etc").is_err());
        assert!(DirFetcher::within(ws, "..").is_err());
        assert!(DirFetcher::within(ws, "app/../../other").is_err());
        assert!(DirFetcher::within(ws, "  ").is_err());
    }

    #[test]
    fn install_then_serve_from_cache() {
        let cache = cache();
        let origin = MapFetcher::with(&[("index.html", "<html>"), ("script.js", "js")]);
        let files = vec!["./".to_string(), "./index.html".to_string(), "./script.js".to_string()];
        assert_eq!(cache.install(&files, &origin).expect("install"), 2);

        let offline = MapFetcher::default();
        let hit = cache.fetch("./script.js", &offline).expect("cached");
        assert_eq!(hit.source, AssetSource::Cache);
        assert_eq!(hit.body, b"js");
        assert_eq!(hit.sha256, sha256_hex(b"js"));
        assert!(offline.calls.borrow().is_empty());
        assert_eq!(cache.list().expect("list").len(), 2);
    }

    #[test]
    fn miss_falls_back_to_origin_without_caching() {
        let cache = cache();
        let origin = MapFetcher::with(&[("manifest.json", "{}")]);
        let got = cache.fetch("./manifest.json", &origin).expect("network");
        assert_eq!(got.source, AssetSource::Network);
        assert!(cache.lookup("manifest.json").expect("lookup").is_none());
    }

    #[test]
    fn failed_install_keeps_nothing() {
        let cache = cache();
        let origin = MapFetcher::with(&[("index.html", "<html>")]);
        let files = vec!["./index.html".to_string(), "./missing.js".to_string()];
        assert!(cache.install(&files, &origin).is_err());
        assert!(cache.list().expect("list").is_empty());
    }
}
