// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::layout::FlowchartLayoutError;
use crate::model::{FlowchartDocument, FlowchartId, FlowchartSummary, NodeId};

const STORAGE_SUBDIR: &[&str] = &[".claude", "flowplans"];
const PORT_FILENAME: &str = ".port";

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    NotFound {
        id: FlowchartId,
    },
    NodeNotFound {
        id: FlowchartId,
        node_id: NodeId,
    },
    InvalidName {
        name: String,
    },
    Layout {
        id: FlowchartId,
        source: Box<FlowchartLayoutError>,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::NotFound { id } => write!(f, "Flowchart '{id}' not found"),
            Self::NodeNotFound { id, node_id } => {
                write!(f, "Node '{node_id}' not found in flowchart '{id}'")
            }
            Self::InvalidName { name } => {
                write!(f, "cannot derive a flowchart id from name '{name}'")
            }
            Self::Layout { id, source } => {
                write!(f, "cannot layout flowchart '{id}': {source}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::NotFound { .. } => None,
            Self::NodeNotFound { .. } => None,
            Self::InvalidName { .. } => None,
            Self::Layout { source, .. } => Some(source),
            Self::SymlinkRefused { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable
    /// storage where possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

/// The on-disk home of a project's flowcharts: `<project>/.claude/flowplans/`,
/// one `{id}.json` per document plus the `.port` coordination file.
#[derive(Debug, Clone)]
pub struct FlowchartDir {
    root: PathBuf,
    durability: WriteDurability,
}

impl FlowchartDir {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let mut root = project_dir.into();
        for segment in STORAGE_SUBDIR {
            root.push(segment);
        }
        Self {
            root,
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_file_name(id: &FlowchartId) -> String {
        format!("{id}.json")
    }

    pub fn document_path(&self, id: &FlowchartId) -> PathBuf {
        self.root.join(Self::document_file_name(id))
    }

    pub fn port_file_path(&self) -> PathBuf {
        self.root.join(PORT_FILENAME)
    }

    /// True for file names the store treats as documents. The `.port` file,
    /// in-flight temp files, and anything that is not `*.json` are invisible
    /// to `list` and the watcher.
    pub fn is_document_file_name(name: &str) -> bool {
        name.ends_with(".json") && !name.starts_with('.')
    }

    pub fn load_document(&self, id: &FlowchartId) -> Result<Option<FlowchartDocument>, StoreError> {
        let path = self.document_path(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let doc = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        Ok(Some(doc))
    }

    pub fn save_document(&self, doc: &FlowchartDocument) -> Result<(), StoreError> {
        let path = self.document_path(doc.id());
        let doc_str = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        self.write_atomic(&path, format!("{doc_str}\n").as_bytes())
    }

    /// Enumerates every decodable document. Files that fail to decode are
    /// skipped, never fatal; one corrupt file must not take down listing for
    /// the rest of the project.
    pub fn list_summaries(&self) -> Result<Vec<FlowchartSummary>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut paths = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(Self::is_document_file_name)
            })
            .collect::<Vec<_>>();
        paths.sort();

        let mut summaries = Vec::with_capacity(paths.len());
        for path in paths {
            let Ok(raw) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(doc) = serde_json::from_str::<FlowchartDocument>(&raw) else {
                continue;
            };
            summaries.push(doc.summary());
        }

        Ok(summaries)
    }

    pub fn write_port_file(&self, contents: &[u8]) -> Result<(), StoreError> {
        self.write_atomic(&self.port_file_path(), contents)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        match fs::symlink_metadata(path) {
            Ok(md) if md.file_type().is_symlink() => {
                return Err(StoreError::SymlinkRefused {
                    path: path.to_path_buf(),
                });
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let Some(file_name) = path.file_name() else {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("path has no file name"),
            });
        };

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let tmp_path = self.root.join(format!(
            ".flowplan.tmp.{}.{}",
            file_name.to_string_lossy(),
            nanos
        ));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        file.write_all(contents).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        if self.durability == WriteDurability::Durable {
            file.sync_all().map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }
        drop(file);

        if let Err(source) = rename_overwrite(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        if self.durability == WriteDurability::Durable {
            #[cfg(unix)]
            {
                let dir = fs::File::open(&self.root).map_err(|source| StoreError::Io {
                    path: self.root.clone(),
                    source,
                })?;
                dir.sync_all().map_err(|source| StoreError::Io {
                    path: self.root.clone(),
                    source,
                })?;
            }
        }

        Ok(())
    }
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}
