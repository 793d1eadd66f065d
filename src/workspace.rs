use anyhow::Context;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;
use tracing::info;

use crate::asset_cache::{AssetCache, DirFetcher};
use crate::config;
use crate::controller::SelectionController;
use crate::db;
use crate::error::Result;
use crate::gate::AdminGate;
use crate::roster::RosterManager;
use crate::store::{RosterStore, SeedSource, SqliteKv};

/// Everything bound to one opened workspace directory. Built once per
/// `workspace.select` and handed to the IPC handlers.
pub struct Workspace {
    pub path: PathBuf,
    pub conn: Rc<Connection>,
    pub roster: RosterManager<SqliteKv>,
    pub admin: AdminGate<SqliteKv>,
    pub selection: SelectionController,
}

impl Workspace {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Rc::new(db::open_db(path)?);
        let kv = SqliteKv::new(Rc::clone(&conn));

        let seed = SeedSource::for_workspace(path)?;
        let roster = RosterManager::open(RosterStore::new(kv.clone(), seed))?;
        let admin = AdminGate::open(kv, config::admin_credentials(&conn)?)?;
        let selection = SelectionController::new(config::pin_retry_delay(&conn)?);

        info!(
            workspace = %path.to_string_lossy(),
            students = roster.len(),
            admin = admin.is_logged_in(),
            "workspace opened"
        );
        Ok(Self {
            path: path.to_path_buf(),
            conn,
            roster,
            admin,
            selection,
        })
    }

    /// Runs deferred work that has come due.
    pub fn tick(&mut self, now: Instant) {
        self.selection.tick(now);
    }

    /// Re-reads settings that live gates depend on.
    pub fn reload_settings(&mut self) -> Result<()> {
        self.admin
            .set_credentials(config::admin_credentials(&self.conn)?);
        self.selection
            .set_retry_delay(config::pin_retry_delay(&self.conn)?);
        Ok(())
    }

    pub fn asset_cache(&self) -> anyhow::Result<(AssetCache, DirFetcher)> {
        let settings = config::asset_settings(&self.conn)?;
        Ok((
            AssetCache::new(Rc::clone(&self.conn), settings.cache_name),
            DirFetcher::within(&self.path, &settings.origin_dir)?,
        ))
    }

    pub fn asset_files(&self) -> anyhow::Result<Vec<String>> {
        Ok(config::asset_settings(&self.conn)
            .context("failed to load asset settings")?
            .files)
    }
}
