use crate::config::Config;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
}

impl ReportFile {
    pub fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub struct ReportDiscovery {
    config: Config,
}

impl ReportDiscovery {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Finds spreadsheet reports under `root`, sorted by path.
    pub fn discover(&self, root: &Path) -> crate::Result<Vec<ReportFile>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .standard_filters(true) // .gitignore, hidden files
            .git_ignore(true)
            .git_exclude(true)
            .build();

        for result in walker {
            let entry = result?;
            let path = entry.path();

            if !path.is_file() || self.should_ignore_file(path) {
                continue;
            }

            if let Some(report) = self.process_file(path)? {
                files.push(report);
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(root = %root.display(), found = files.len(), "discovered report files");
        Ok(files)
    }

    fn should_ignore_file(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().map(|name| name.to_string_lossy()) else {
            return true;
        };

        // Excel keeps "~$name.xlsx" lock files next to open workbooks.
        if file_name.starts_with("~$") {
            return true;
        }

        self.config.ignore_patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                file_name.ends_with(suffix)
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                file_name.starts_with(prefix)
            } else {
                path.components()
                    .any(|component| component.as_os_str().to_string_lossy() == *pattern)
            }
        })
    }

    fn process_file(&self, path: &Path) -> crate::Result<Option<ReportFile>> {
        let Some(extension) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
        else {
            return Ok(None);
        };

        if !self.config.file_extensions.contains(&extension) {
            return Ok(None);
        }

        let size = fs::metadata(path)?.len();
        if size > self.config.max_file_size {
            tracing::warn!(path = %path.display(), size, "skipping oversized report");
            return Ok(None);
        }

        Ok(Some(ReportFile {
            path: path.to_path_buf(),
            size,
            extension,
        }))
    }
}
