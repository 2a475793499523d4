//! Module graph discovery and file-set assignment
//!
//! Two views of the project feed the pipeline:
//!
//! - the *reactor*: module paths declared in `<modules>` of the root
//!   descriptor (recursively), the set Maven will actually build from this
//!   checkout;
//! - the *plan*: module directories found on disk, each classified with a
//!   role and given the file set whose git history drives its version.
//!
//! Role assignment is configuration, not inference: the layout names the
//! site, themes, frontend, and parent paths, and everything else found by
//! the scan is an ordinary module.

use crate::artifact::ModuleRole;
use crate::descriptor::Pom;
use crate::error::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Project layout: which paths play the special roles. Doubles as the
/// `[layout]` section of `kiln.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub site: PathBuf,
    pub themes: PathBuf,
    pub frontend: PathBuf,
    pub parent: PathBuf,
    /// Cross-cutting frontend asset paths every ordinary module depends on
    pub frontend_files: Vec<PathBuf>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            site: PathBuf::from("site"),
            themes: PathBuf::from("themes"),
            frontend: PathBuf::from("frontend"),
            parent: PathBuf::from("parent"),
            frontend_files: ["styleguide", "package.json", "gulpfile.js", "yarn.lock", ".npmrc"]
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

impl Layout {
    /// The frontend file set: the configured asset paths plus the frontend
    /// module directory itself
    pub fn frontend_set(&self) -> Vec<PathBuf> {
        let mut set = self.frontend_files.clone();
        set.push(self.frontend.clone());
        set
    }
}

/// A module directory with its role and version-driving file set
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub path: PathBuf,
    pub role: ModuleRole,
    pub file_set: Vec<PathBuf>,
}

/// Sub-module paths declared in the descriptor at `module`, relative to
/// `module`. With `recursive`, children are prefixed with their parent
/// path, depth-first in declaration order. A missing descriptor yields an
/// empty list.
pub async fn submodules(root: &Path, module: &Path, recursive: bool) -> KilnResult<Vec<PathBuf>> {
    let mut list = Vec::new();
    let Some(pom) = Pom::read(root, module).await? else {
        return Ok(list);
    };
    for name in pom.modules() {
        let child = PathBuf::from(name);
        if recursive {
            let nested = Box::pin(submodules(root, &module.join(name), true)).await?;
            list.push(child.clone());
            list.extend(nested.into_iter().map(|sub| child.join(sub)));
        } else {
            list.push(child);
        }
    }
    Ok(list)
}

/// The reactor set: every module path reachable from the root descriptor,
/// plus the root itself
pub async fn reactor(root: &Path) -> KilnResult<HashSet<PathBuf>> {
    let mut set: HashSet<PathBuf> = submodules(root, Path::new("."), true)
        .await?
        .into_iter()
        .collect();
    set.insert(PathBuf::from("."));
    Ok(set)
}

/// Scan the project and assign a role and file set to every module:
///
/// - aggregate root: only its own descriptor, the cheapest to invalidate;
/// - site: the entire repository, any change invalidates it;
/// - frontend: the frontend file set;
/// - themes container: the loose files directly under the themes dir;
/// - each theme: its own dir plus the frontend set plus the themes files;
/// - ordinary modules (parent included): their own dir plus the shared
///   inputs (root descriptor, parent path, frontend files), because they
///   may inherit build behavior from any of those.
pub async fn plan(root: &Path, layout: &Layout) -> KilnResult<Vec<ModuleEntry>> {
    let frontend_set = layout.frontend_set();
    let themes_files = dotted_files(root, &layout.themes).await?;
    let theme_dirs: Vec<PathBuf> = module_dirs(&root.join(&layout.themes))
        .await?
        .into_iter()
        .map(|name| layout.themes.join(name))
        .collect();

    let mut shared = vec![PathBuf::from("pom.xml"), layout.parent.clone()];
    shared.extend(frontend_set.iter().cloned());

    let mut entries = vec![
        ModuleEntry {
            path: PathBuf::from("."),
            role: ModuleRole::Aggregate,
            file_set: vec![PathBuf::from("pom.xml")],
        },
        ModuleEntry {
            path: layout.site.clone(),
            role: ModuleRole::Site,
            file_set: vec![PathBuf::from(".")],
        },
        ModuleEntry {
            path: layout.frontend.clone(),
            role: ModuleRole::Frontend,
            file_set: frontend_set.clone(),
        },
        ModuleEntry {
            path: layout.themes.clone(),
            role: ModuleRole::Themes,
            file_set: themes_files.clone(),
        },
    ];

    for theme in theme_dirs {
        let mut file_set = vec![theme.clone()];
        file_set.extend(frontend_set.iter().cloned());
        file_set.extend(themes_files.iter().cloned());
        entries.push(ModuleEntry {
            path: theme,
            role: ModuleRole::Theme,
            file_set,
        });
    }

    for name in module_dirs(root).await? {
        let path = PathBuf::from(&name);
        if path == layout.site || path == layout.themes || frontend_set.contains(&path) {
            continue;
        }
        let role = if path == layout.parent {
            ModuleRole::Parent
        } else {
            ModuleRole::Ordinary
        };
        let mut file_set = vec![path.clone()];
        file_set.extend(shared.iter().cloned());
        entries.push(ModuleEntry {
            path,
            role,
            file_set,
        });
    }

    Ok(entries)
}

/// Names of direct subdirectories containing a descriptor, sorted
async fn module_dirs(dir: &Path) -> KilnResult<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(KilnError::io(format!("reading {}", dir.display()), e)),
    };
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| KilnError::io(format!("reading {}", dir.display()), e))?
    {
        let path = entry.path();
        if path.is_dir() && path.join("pom.xml").exists() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Entries directly under `dir` with a dot in the name (the container
/// descriptor and loose asset files, not the theme subdirectories),
/// returned as root-relative paths, sorted
async fn dotted_files(root: &Path, dir: &Path) -> KilnResult<Vec<PathBuf>> {
    let full = root.join(dir);
    let mut files = Vec::new();
    let mut entries = match fs::read_dir(&full).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(KilnError::io(format!("reading {}", full.display()), e)),
    };
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| KilnError::io(format!("reading {}", full.display()), e))?
    {
        if let Some(name) = entry.file_name().to_str() {
            if name.contains('.') {
                files.push(dir.join(name));
            }
        }
    }
    files.sort();
    Ok(files)
}
