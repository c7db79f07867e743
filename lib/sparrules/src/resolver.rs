//! Resolution of ruleset identifiers into rules.

use crate::archive::{ARCHIVE_EXTENSION, ArchiveMounts};
use crate::builtin::{BUILTIN_SCHEME, BuiltinRuleset};
use crate::error::ResolutionError;
use crate::rule::RuleDefinition;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// A parsed ruleset identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesetId {
    /// `builtin://name`
    Builtin(String),
    /// A directory, an archive or a directory inside an archive.
    Path(PathBuf),
}

impl RulesetId {
    pub fn parse(id: &str) -> Result<Self, ResolutionError> {
        if let Some(name) = id.strip_prefix(BUILTIN_SCHEME) {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(ResolutionError::InvalidIdentifier {
                    id: id.to_owned(),
                    reason: "a built-in reference must be followed by a single name",
                });
            }
            Ok(Self::Builtin(name.to_owned()))
        } else if id.is_empty() {
            Err(ResolutionError::InvalidIdentifier {
                id: id.to_owned(),
                reason: "the identifier is empty",
            })
        } else {
            Ok(Self::Path(PathBuf::from(id)))
        }
    }
}

/// Turns ruleset identifiers into ordered lists of rules.
///
/// Rules of a directory or archive are sorted by entry name.
/// Archives are mounted on first use and stay mounted until [`release`](Self::release) is called
/// or the resolver is dropped.
#[derive(Default)]
pub struct ResourceResolver {
    builtin_location: Option<PathBuf>,
    mounts: ArchiveMounts,
}

impl ResourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `builtin://name` to `location/name` instead of the compiled-in rulesets.
    ///
    /// The location may be a directory or a zip archive.
    #[must_use]
    pub fn with_builtin_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.builtin_location = Some(location.into());
        self
    }

    pub fn resolve(&mut self, id: &str) -> Result<Vec<RuleDefinition>, ResolutionError> {
        let rules = match RulesetId::parse(id)? {
            RulesetId::Builtin(name) => {
                if let Some(location) = &self.builtin_location {
                    let path = location.join(&name);
                    self.resolve_path(&path)?
                } else {
                    BuiltinRuleset::get(&name)
                        .ok_or_else(|| ResolutionError::UnknownBuiltin {
                            available: BuiltinRuleset::all()
                                .iter()
                                .map(BuiltinRuleset::name)
                                .collect::<Vec<_>>()
                                .join(", "),
                            name,
                        })?
                        .rules()
                }
            }
            RulesetId::Path(path) => self.resolve_path(&path)?,
        };
        info!("Resolved {} rules from {id}", rules.len());
        Ok(rules)
    }

    /// Number of archives currently mounted.
    pub fn mounted_archives(&self) -> usize {
        self.mounts.len()
    }

    /// Releases all the mounted archives.
    pub fn release(&mut self) {
        self.mounts.release();
    }

    fn resolve_path(&mut self, path: &Path) -> Result<Vec<RuleDefinition>, ResolutionError> {
        if path.is_dir() {
            return read_directory(path);
        }
        if let Some((archive, inner)) = find_archive(path) {
            let archive = self.mounts.mount(archive)?;
            let mut rules = Vec::new();
            for entry in archive.list(&inner)? {
                let text = archive.read_to_string(&entry)?;
                let name = entry.rsplit('/').next().unwrap_or(&entry);
                debug!("Rule {entry} from {}", archive.path().display());
                rules.push(RuleDefinition::new(name, text));
            }
            return Ok(rules);
        }
        if path.exists() {
            Err(ResolutionError::NotADirectory {
                path: path.to_owned(),
            })
        } else {
            Err(ResolutionError::NotFound {
                path: path.to_owned(),
            })
        }
    }
}

/// Finds the zip file that contains `path` and the `/`-separated directory inside of it.
fn find_archive(path: &Path) -> Option<(&Path, String)> {
    path.ancestors().find_map(|ancestor| {
        let is_archive = ancestor
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if !is_archive || !ancestor.is_file() {
            return None;
        }
        let inner = path
            .strip_prefix(ancestor)
            .ok()?
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        Some((ancestor, inner))
    })
}

fn read_directory(dir: &Path) -> Result<Vec<RuleDefinition>, ResolutionError> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| ResolutionError::read(dir.display().to_string(), e))?;
    for entry in entries {
        let path = entry
            .map_err(|e| ResolutionError::read(dir.display().to_string(), e))?
            .path();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.starts_with('.') || !path.is_file() {
            continue;
        }
        files.push((name, path));
    }
    files.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    files
        .into_iter()
        .map(|(name, path)| {
            debug!("Rule {}", path.display());
            let bytes = fs::read(&path)
                .map_err(|e| ResolutionError::read(path.display().to_string(), e))?;
            let text = String::from_utf8(bytes).map_err(|_| ResolutionError::NotUtf8 {
                entry: path.display().to_string(),
            })?;
            Ok(RuleDefinition::new(name, text))
        })
        .collect()
}
