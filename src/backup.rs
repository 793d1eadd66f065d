use anyhow::{anyhow, Context};
use rusqlite::{Connection, OpenFlags};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::db::DB_FILE_NAME;

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/outing.sqlite3";
const SNAPSHOT_ENTRY: &str = "data/students.js";
pub const BUNDLE_FORMAT_V1: &str = "outing-workspace-v1";
pub const LEGACY_SQLITE_FORMAT: &str = "legacy-sqlite3";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

fn sha256_file(path: &Path) -> anyhow::Result<String> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut f, &mut hasher)
        .with_context(|| format!("failed to hash {}", path.to_string_lossy()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Writes the workspace database plus the current roster snapshot into a
/// zip bundle at `out_path`.
pub fn export_workspace_bundle(
    workspace_path: &Path,
    snapshot_text: &str,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE_NAME);
    if !db_path.is_file() {
        return Err(anyhow!(
            "workspace database not found: {}",
            db_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let db_sha256 = sha256_file(&db_path)?;

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "dbSha256": db_sha256,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DB_ENTRY, opts)
        .context("failed to start database entry")?;
    let mut db_file = File::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    std::io::copy(&mut db_file, &mut zip).context("failed to write database entry")?;

    zip.start_file(SNAPSHOT_ENTRY, opts)
        .context("failed to start snapshot entry")?;
    zip.write_all(snapshot_text.as_bytes())
        .context("failed to write snapshot entry")?;

    zip.finish().context("failed to finalize zip bundle")?;
    info!(bundle = %out_path.to_string_lossy(), "workspace bundle exported");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 3,
        db_sha256,
    })
}

/// Restores the workspace database from a bundle (or a raw SQLite copy).
/// The caller must have closed every connection to the workspace first.
/// The incoming database is staged next to the live one and only replaces
/// it once it has been verified; on any error the live database is untouched.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;
    let dst = workspace_path.join(DB_FILE_NAME);
    let tmp_dst = workspace_path.join(format!("{}.importing", DB_FILE_NAME));
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    let staged = if is_zip_file(in_path)? {
        stage_from_bundle(in_path, &tmp_dst)
    } else {
        stage_legacy_copy(in_path, &tmp_dst)
    };
    let detected = match staged.and_then(|format| {
        verify_workspace_db(&tmp_dst)?;
        Ok(format)
    }) {
        Ok(v) => v,
        Err(e) => {
            let _ = std::fs::remove_file(&tmp_dst);
            return Err(e);
        }
    };

    if dst.exists() {
        std::fs::remove_file(&dst).with_context(|| {
            format!(
                "failed to remove existing database {}",
                dst.to_string_lossy()
            )
        })?;
    }
    std::fs::rename(&tmp_dst, &dst).with_context(|| {
        format!(
            "failed to move extracted database to {}",
            dst.to_string_lossy()
        )
    })?;
    info!(
        workspace = %workspace_path.to_string_lossy(),
        format = detected,
        "workspace bundle imported"
    );

    Ok(ImportSummary {
        bundle_format_detected: detected.to_string(),
    })
}

fn stage_legacy_copy(in_path: &Path, tmp_dst: &Path) -> anyhow::Result<&'static str> {
    std::fs::copy(in_path, tmp_dst).with_context(|| {
        format!(
            "failed to copy legacy sqlite backup from {}",
            in_path.to_string_lossy()
        )
    })?;
    Ok(LEGACY_SQLITE_FORMAT)
}

fn stage_from_bundle(in_path: &Path, tmp_dst: &Path) -> anyhow::Result<&'static str> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    match manifest.get("version").and_then(|v| v.as_u64()) {
        Some(1) => {}
        other => return Err(anyhow!("unsupported bundle version: {:?}", other)),
    }
    let expected_sha = manifest
        .get("dbSha256")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("bundle manifest missing dbSha256"))?
        .to_string();

    let mut db_out = File::create(tmp_dst).with_context(|| {
        format!(
            "failed to create temp database {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    {
        let mut db_entry = archive
            .by_name(DB_ENTRY)
            .context("bundle missing db/outing.sqlite3")?;
        std::io::copy(&mut db_entry, &mut db_out).context("failed to extract database entry")?;
    }
    db_out
        .flush()
        .context("failed to flush extracted database")?;
    drop(db_out);

    let actual = sha256_file(tmp_dst)?;
    if actual != expected_sha {
        return Err(anyhow!(
            "database checksum mismatch: expected {}, got {}",
            expected_sha,
            actual
        ));
    }
    Ok(BUNDLE_FORMAT_V1)
}

/// The staged file must be a readable SQLite database holding the roster
/// key-value table.
fn verify_workspace_db(path: &Path) -> anyhow::Result<()> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    conn.query_row("PRAGMA schema_version", [], |r| r.get::<_, i64>(0))
        .context("imported file is not a SQLite database")?;
    let has_kv: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store')",
            [],
            |r| r.get(0),
        )
        .context("failed to inspect imported database")?;
    if !has_kv {
        return Err(anyhow!("imported database is not an outing workspace"));
    }
    Ok(())
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
