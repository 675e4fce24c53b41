//! Integration module folders on disk
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Required-file checks and the missing-files warning
//! - 1.0.0: Folder listing and case/whitespace-insensitive lookup

use super::manifest::{ModuleManifest, HELP_FILE, INFO_FILE, MANIFEST_FILE};
use anyhow::{Context, Result};
use log::warn;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const NO_DESCRIPTION: &str = "_No description available._";

/// Lowercase with all whitespace removed, so `Microsoft Entra` == `microsoftentra`
pub fn normalize_module_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFolder {
    /// Folder name as it appears on disk
    pub name: String,
    pub path: PathBuf,
}

/// Outcome of checking a folder against its required files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCheck {
    pub missing: Vec<String>,
    /// Files present that are not in the required set
    pub extra: Vec<String>,
}

impl FileCheck {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    root: PathBuf,
    docs_url: String,
}

impl ModuleCatalog {
    pub fn new(root: impl Into<PathBuf>, docs_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            docs_url: docs_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All module folders, sorted by name. A missing services directory has none.
    pub fn folders(&self) -> Result<Vec<ModuleFolder>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read services directory {}", self.root.display())
                })
            }
        };

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(ModuleFolder {
                    name: entry.file_name().to_string_lossy().to_string(),
                    path: entry.path(),
                });
            }
        }
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    /// Resolve a user-supplied name to a folder (case-insensitive, whitespace ignored)
    pub fn find(&self, name: &str) -> Result<Option<ModuleFolder>> {
        let wanted = normalize_module_name(name);
        if wanted.is_empty() {
            return Ok(None);
        }
        Ok(self
            .folders()?
            .into_iter()
            .find(|folder| normalize_module_name(&folder.name) == wanted))
    }

    /// Contents of `info.md`, or a placeholder
    pub fn info(&self, folder: &ModuleFolder) -> String {
        match std::fs::read_to_string(folder.path.join(INFO_FILE)) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => NO_DESCRIPTION.to_string(),
        }
    }

    /// Contents of `moduleHelp.md`, if present
    pub fn help_file(&self, folder: &ModuleFolder) -> Option<String> {
        std::fs::read_to_string(folder.path.join(HELP_FILE)).ok()
    }

    /// `### <folder>\n<info>` for every installed module
    pub fn list_integrations(&self) -> Result<Vec<String>> {
        Ok(self
            .folders()?
            .iter()
            .map(|folder| format!("### {}\n{}", folder.name, self.info(folder)))
            .collect())
    }

    /// Required files of a folder: from its manifest, or the defaults
    pub fn required_files(&self, folder: &ModuleFolder) -> Vec<String> {
        let manifest_path = folder.path.join(MANIFEST_FILE);
        if manifest_path.is_file() {
            match ModuleManifest::load(&manifest_path) {
                Ok(manifest) => return manifest.required_files,
                Err(e) => warn!("Ignoring invalid manifest {}: {e}", manifest_path.display()),
            }
        }
        vec![MANIFEST_FILE.to_string(), INFO_FILE.to_string()]
    }

    pub fn check_files(&self, folder: &ModuleFolder) -> Result<FileCheck> {
        let required = self.required_files(folder);

        let mut present = Vec::new();
        for entry in std::fs::read_dir(&folder.path)? {
            let entry = entry?;
            present.push(entry.file_name().to_string_lossy().to_string());
        }
        present.sort();

        let missing = required
            .iter()
            .filter(|file| !present.contains(*file))
            .cloned()
            .collect();
        let extra = present
            .into_iter()
            .filter(|file| !required.contains(file))
            .collect();

        Ok(FileCheck { missing, extra })
    }

    /// User-facing warning for a folder with missing required files
    pub fn missing_files_warning(&self, folder: &ModuleFolder, check: &FileCheck) -> String {
        let files_text = bullet_list(&check.missing);
        let mut warning = format!(
            "⚠️ Warning: The integration folder **\"{}\"** is missing required file(s):\n{}\n\n\
             At minimum, `{MANIFEST_FILE}` and `{INFO_FILE}` are expected in every module folder.\n\
             This may indicate the module was not downloaded completely or is missing files.\n\n\
             Please verify the module in the official repository:\n{}",
            folder.name, files_text, self.docs_url
        );

        if !check.extra.is_empty() {
            warning.push_str(&format!(
                "\n\n🔎 Note: This module folder also contains other file(s):\n{}\n\
                 If these files are mentioned in the module documentation or required for operation, \
                 please ensure they are present and up to date.",
                bullet_list(&check.extra)
            ));
        }
        warning
    }
}

fn bullet_list(files: &[String]) -> String {
    files
        .iter()
        .map(|f| format!("- `{f}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_catalog() -> (tempfile::TempDir, ModuleCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ModuleCatalog::new(dir.path(), "https://docs.example.com/modules");
        (dir, catalog)
    }

    fn add_folder(dir: &tempfile::TempDir, name: &str, files: &[(&str, &str)]) {
        let path = dir.path().join(name);
        fs::create_dir_all(&path).unwrap();
        for (file, contents) in files {
            fs::write(path.join(file), contents).unwrap();
        }
    }

    #[test]
    fn test_normalize_module_name() {
        assert_eq!(normalize_module_name("Microsoft Entra"), "microsoftentra");
        assert_eq!(normalize_module_name("  micro SOFT\tentra "), "microsoftentra");
    }

    #[test]
    fn test_missing_root_is_empty() {
        let catalog = ModuleCatalog::new("/definitely/not/here", "x");
        assert!(catalog.folders().unwrap().is_empty());
        assert!(catalog.find("anything").unwrap().is_none());
    }

    #[test]
    fn test_find_ignores_case_and_spaces() {
        let (dir, catalog) = temp_catalog();
        add_folder(&dir, "Microsoft Entra", &[]);
        add_folder(&dir, "Weather", &[]);
        let found = catalog.find("microsoftentra").unwrap().unwrap();
        assert_eq!(found.name, "Microsoft Entra");
        assert!(catalog.find("WEATHER").unwrap().is_some());
        assert!(catalog.find("Stocks").unwrap().is_none());
        assert!(catalog.find("   ").unwrap().is_none());
    }

    #[test]
    fn test_list_integrations_uses_info() {
        let (dir, catalog) = temp_catalog();
        add_folder(&dir, "Alpha", &[("info.md", "  Alpha does things.\n")]);
        add_folder(&dir, "Beta", &[]);
        let listing = catalog.list_integrations().unwrap();
        assert_eq!(listing[0], "### Alpha\nAlpha does things.");
        assert_eq!(listing[1], format!("### Beta\n{NO_DESCRIPTION}"));
    }

    #[test]
    fn test_check_files_default_requirements() {
        let (dir, catalog) = temp_catalog();
        add_folder(&dir, "Alpha", &[("info.md", "x"), ("notes.txt", "y")]);
        let folder = catalog.find("alpha").unwrap().unwrap();
        let check = catalog.check_files(&folder).unwrap();

        assert_eq!(check.missing, vec!["module.yaml"]);
        assert_eq!(check.extra, vec!["notes.txt"]);
        assert!(!check.is_complete());

        let warning = catalog.missing_files_warning(&folder, &check);
        assert!(warning.contains("**\"Alpha\"**"));
        assert!(warning.contains("- `module.yaml`"));
        assert!(warning.contains("- `notes.txt`"));
        assert!(warning.contains("https://docs.example.com/modules"));
    }

    #[test]
    fn test_check_files_manifest_requirements() {
        let (dir, catalog) = temp_catalog();
        add_folder(
            &dir,
            "Gamma",
            &[
                ("module.yaml", "required_files: [module.yaml, info.md, gamma.py]\n"),
                ("info.md", "gamma"),
            ],
        );
        let folder = catalog.find("gamma").unwrap().unwrap();
        let check = catalog.check_files(&folder).unwrap();
        assert_eq!(check.missing, vec!["gamma.py"]);
        assert!(check.extra.is_empty());
    }
}
