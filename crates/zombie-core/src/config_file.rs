use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::database::{Column, ColumnMap};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: Option<DatabaseConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the retraction CSV.
    pub path: Option<String>,
    pub columns: Option<ColumnsConfig>,
}

/// Header name overrides, one per logical column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnsConfig {
    pub doi: Option<String>,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub retraction_date: Option<String>,
    pub reason: Option<String>,
    pub nature: Option<String>,
    pub notice_doi: Option<String>,
    pub journal: Option<String>,
    pub record_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `text`, `json`, `csv` or `markdown`.
    pub format: Option<String>,
    pub color: Option<bool>,
}

impl ColumnsConfig {
    fn overrides(&self) -> [(Column, Option<&String>); 9] {
        [
            (Column::Doi, self.doi.as_ref()),
            (Column::Title, self.title.as_ref()),
            (Column::Authors, self.authors.as_ref()),
            (Column::RetractionDate, self.retraction_date.as_ref()),
            (Column::Reason, self.reason.as_ref()),
            (Column::Nature, self.nature.as_ref()),
            (Column::NoticeDoi, self.notice_doi.as_ref()),
            (Column::Journal, self.journal.as_ref()),
            (Column::RecordId, self.record_id.as_ref()),
        ]
    }

    /// Put every configured header name first for its column.
    pub fn apply(&self, columns: &mut ColumnMap) {
        for (column, name) in self.overrides() {
            if let Some(name) = name {
                columns.prefer(column, name.clone());
            }
        }
    }

    /// A default [`ColumnMap`] with these overrides applied.
    pub fn to_column_map(&self) -> ColumnMap {
        let mut columns = ColumnMap::default();
        self.apply(&mut columns);
        columns
    }
}

impl ConfigFile {
    pub fn database_path(&self) -> Option<&str> {
        self.database.as_ref()?.path.as_deref()
    }

    pub fn column_map(&self) -> ColumnMap {
        self.database
            .as_ref()
            .and_then(|d| d.columns.as_ref())
            .map(ColumnsConfig::to_column_map)
            .unwrap_or_default()
    }

    pub fn output_format(&self) -> Option<&str> {
        self.output.as_ref()?.format.as_deref()
    }

    pub fn color(&self) -> Option<bool> {
        self.output.as_ref()?.color
    }
}

/// Platform config directory path: `<config_dir>/zombie/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zombie").join("config.toml"))
}

/// Load config by cascading CWD `.zombie.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".zombie.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

fn pick<T: Clone>(overlay: Option<&T>, base: Option<&T>) -> Option<T> {
    overlay.or(base).cloned()
}

fn merge_columns(base: Option<&ColumnsConfig>, overlay: Option<&ColumnsConfig>) -> ColumnsConfig {
    ColumnsConfig {
        doi: pick(overlay.and_then(|c| c.doi.as_ref()), base.and_then(|c| c.doi.as_ref())),
        title: pick(
            overlay.and_then(|c| c.title.as_ref()),
            base.and_then(|c| c.title.as_ref()),
        ),
        authors: pick(
            overlay.and_then(|c| c.authors.as_ref()),
            base.and_then(|c| c.authors.as_ref()),
        ),
        retraction_date: pick(
            overlay.and_then(|c| c.retraction_date.as_ref()),
            base.and_then(|c| c.retraction_date.as_ref()),
        ),
        reason: pick(
            overlay.and_then(|c| c.reason.as_ref()),
            base.and_then(|c| c.reason.as_ref()),
        ),
        nature: pick(
            overlay.and_then(|c| c.nature.as_ref()),
            base.and_then(|c| c.nature.as_ref()),
        ),
        notice_doi: pick(
            overlay.and_then(|c| c.notice_doi.as_ref()),
            base.and_then(|c| c.notice_doi.as_ref()),
        ),
        journal: pick(
            overlay.and_then(|c| c.journal.as_ref()),
            base.and_then(|c| c.journal.as_ref()),
        ),
        record_id: pick(
            overlay.and_then(|c| c.record_id.as_ref()),
            base.and_then(|c| c.record_id.as_ref()),
        ),
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_db = base.database.as_ref();
    let overlay_db = overlay.database.as_ref();
    let base_out = base.output.as_ref();
    let overlay_out = overlay.output.as_ref();

    ConfigFile {
        database: Some(DatabaseConfig {
            path: pick(
                overlay_db.and_then(|d| d.path.as_ref()),
                base_db.and_then(|d| d.path.as_ref()),
            ),
            columns: Some(merge_columns(
                base_db.and_then(|d| d.columns.as_ref()),
                overlay_db.and_then(|d| d.columns.as_ref()),
            )),
        }),
        output: Some(OutputConfig {
            format: pick(
                overlay_out.and_then(|o| o.format.as_ref()),
                base_out.and_then(|o| o.format.as_ref()),
            ),
            color: overlay_out
                .and_then(|o| o.color)
                .or_else(|| base_out.and_then(|o| o.color)),
        }),
    }
}
