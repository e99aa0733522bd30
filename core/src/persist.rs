use crate::engine::Snapshot;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bumped whenever the encoded layout of [`Snapshot`] changes.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_topics: usize,
}

/// Where a model artifact and its companions live.
///
/// For a model at `ir_model.bin` the sidecars are `ir_model.bin.tmp` (write
/// staging) and `ir_model.bin.meta.json`.
pub struct ArtifactPaths {
    model: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(model: P) -> Self {
        Self { model: model.as_ref().to_path_buf() }
    }

    pub fn model(&self) -> &Path {
        &self.model
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut s: OsString = self.model.clone().into_os_string();
        s.push(suffix);
        PathBuf::from(s)
    }

    pub fn meta(&self) -> PathBuf {
        self.with_suffix(".meta.json")
    }
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    version: u32,
    snapshot: &'a Snapshot,
}

#[derive(Deserialize)]
struct Artifact {
    version: u32,
    snapshot: Snapshot,
}

/// Write `bytes` to a staging file next to `path`, then rename over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let tmp = ArtifactPaths::new(path).with_suffix(".tmp");
    let written = File::create(&tmp).and_then(|mut f| {
        f.write_all(bytes)?;
        f.sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }
    Ok(())
}

pub fn save_snapshot(paths: &ArtifactPaths, snapshot: &Snapshot) -> Result<()> {
    let bytes = bincode::serialize(&ArtifactRef { version: ARTIFACT_VERSION, snapshot }).map_err(Error::Encode)?;
    write_atomic(paths.model(), &bytes)?;
    let meta = MetaFile {
        version: ARTIFACT_VERSION,
        created_at: snapshot.created_at().to_string(),
        num_docs: snapshot.documents().len(),
        num_terms: snapshot.vocabulary().len(),
        num_topics: snapshot.model().num_topics(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(path = %paths.model().display(), bytes = bytes.len(), "saved model artifact");
    Ok(())
}

pub fn load_snapshot(paths: &ArtifactPaths) -> Result<Snapshot> {
    let path = paths.model();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let decode_err = |source| Error::Decode { path: path.to_path_buf(), source };
    // version is the leading field, so it can be checked before decoding the rest
    let version: u32 = bincode::deserialize(&bytes).map_err(decode_err)?;
    if version != ARTIFACT_VERSION {
        return Err(Error::UnsupportedVersion { found: version, expected: ARTIFACT_VERSION });
    }
    let artifact: Artifact = bincode::deserialize(&bytes).map_err(decode_err)?;
    debug_assert_eq!(artifact.version, version);
    artifact.snapshot.validate()?;
    tracing::info!(
        path = %path.display(),
        num_docs = artifact.snapshot.documents().len(),
        num_topics = artifact.snapshot.model().num_topics(),
        "loaded model artifact"
    );
    Ok(artifact.snapshot)
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    let meta_path = paths.meta();
    let json = serde_json::to_string_pretty(meta).map_err(|source| Error::Json { path: meta_path.clone(), source })?;
    write_atomic(&meta_path, json.as_bytes())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let meta_path = paths.meta();
    let buf = fs::read_to_string(&meta_path).map_err(|e| Error::io(&meta_path, e))?;
    serde_json::from_str(&buf).map_err(|source| Error::Json { path: meta_path, source })
}
