//! Per-fixture metadata.
//!
//! Fixture configuration lives in optional `options.yml` files. Every file
//! from the spec root down to the fixture directory contributes: scalars from
//! nearer files override, lists accumulate. Keys may be written in the
//! historical symbol form (`:todo:`) or bare (`todo:`).
//!
//! ```yaml
//! ---
//! :todo:
//! - libsass
//! :start_version: '3.5'
//! :output_style: expanded
//! :precision: 10
//! ```
//!
//! Every field has a default, so a fixture without any `options.yml` is valid.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::Deserialize;
use sspec_adapter::OutputStyle;
use sspec_fs::FixtureStore;

use crate::config::coerce_version;
use crate::error::{display, MetadataError};

/// Name of the per-directory metadata file.
pub const OPTIONS_FILE: &str = "options.yml";

/// Numeric precision used when a fixture does not set a valid one.
pub const DEFAULT_PRECISION: u32 = 5;

/// Unquoted version scalars as written. YAML reads `3.10` as the float 3.1,
/// so the literal text is taken from the source instead.
static BARE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^:?(start_version|end_version):[ \t]*([0-9]+(?:\.[0-9]+)?)[ \t]*(?:#.*)?$")
        .expect("valid regex pattern")
});

/// Raw contents of one `options.yml`.
#[derive(Debug, Default, Deserialize)]
struct OptionsFile {
    #[serde(rename = ":name", alias = "name")]
    name: Option<String>,
    #[serde(rename = ":precision", alias = "precision")]
    precision: Option<serde_yaml::Value>,
    #[serde(rename = ":output_style", alias = "output_style")]
    output_style: Option<String>,
    #[serde(rename = ":clean", alias = "clean")]
    clean: Option<bool>,
    #[serde(rename = ":start_version", alias = "start_version")]
    start_version: Option<serde_yaml::Value>,
    #[serde(rename = ":end_version", alias = "end_version")]
    end_version: Option<serde_yaml::Value>,
    #[serde(rename = ":only_on", alias = "only_on", default)]
    only_on: Vec<String>,
    #[serde(rename = ":ignore_for", alias = "ignore_for", default)]
    ignore_for: Vec<String>,
    #[serde(rename = ":ignore_warning_for", alias = "ignore_warning_for", default)]
    ignore_warning_for: Vec<String>,
    #[serde(rename = ":todo", alias = "todo", default)]
    todo: Vec<String>,
    #[serde(rename = ":warning_todo", alias = "warning_todo", default)]
    warning_todo: Vec<String>,
}

/// Resolved, immutable configuration of one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    name: String,
    precision: u32,
    output_style: Option<OutputStyle>,
    clean_output: bool,
    start_version: Option<Version>,
    end_version: Option<Version>,
    only_on: Vec<String>,
    ignore_for: Vec<String>,
    ignore_warning_for: Vec<String>,
    todo: Vec<String>,
    warning_todo: Vec<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            precision: DEFAULT_PRECISION,
            output_style: None,
            clean_output: false,
            start_version: None,
            end_version: None,
            only_on: Vec::new(),
            ignore_for: Vec::new(),
            ignore_warning_for: Vec::new(),
            todo: Vec::new(),
            warning_todo: Vec::new(),
        }
    }
}

impl Metadata {
    /// Load and merge the `options.yml` chain for `fixture_dir`.
    pub fn load<S>(store: &S, fixture_dir: &Path, spec_root: &Path) -> Result<Self, MetadataError>
    where
        S: FixtureStore + ?Sized,
    {
        let mut metadata = Metadata {
            name: default_name(fixture_dir, spec_root),
            ..Metadata::default()
        };

        for dir in options_chain(fixture_dir, spec_root) {
            let path = dir.join(OPTIONS_FILE);
            if !store.is_file(&path) {
                continue;
            }
            let options = read_options(store, &path)?;
            metadata.apply(options, &path)?;
        }

        Ok(metadata)
    }

    /// Parse a single `options.yml` document into metadata named `name`.
    pub fn from_yaml(name: &str, yaml: &str) -> Result<Self, MetadataError> {
        let options = parse_options(yaml, name)?;
        let mut metadata = Metadata {
            name: name.to_string(),
            ..Metadata::default()
        };
        metadata.apply(options, Path::new(name))?;
        Ok(metadata)
    }

    fn apply(&mut self, options: OptionsFile, source: &Path) -> Result<(), MetadataError> {
        if let Some(name) = options.name {
            self.name = name;
        }
        if let Some(raw) = options.precision {
            self.precision = parse_precision(&raw);
        }
        if let Some(raw) = options.output_style {
            self.output_style = raw.parse().ok();
        }
        if let Some(clean) = options.clean {
            self.clean_output = clean;
        }
        if let Some(raw) = options.start_version {
            self.start_version = Some(parse_version(&raw, source)?);
        }
        if let Some(raw) = options.end_version {
            self.end_version = Some(parse_version(&raw, source)?);
        }
        extend_unique(&mut self.only_on, options.only_on);
        extend_unique(&mut self.ignore_for, options.ignore_for);
        extend_unique(&mut self.ignore_warning_for, options.ignore_warning_for);
        extend_unique(&mut self.todo, options.todo);
        extend_unique(&mut self.warning_todo, options.warning_todo);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn output_style(&self) -> Option<OutputStyle> {
        self.output_style
    }

    pub fn clean_output(&self) -> bool {
        self.clean_output
    }

    /// Whether the fixture applies to language version `version`.
    pub fn valid_for_version(&self, version: &Version) -> bool {
        let after_start = self.start_version.as_ref().map_or(true, |s| version >= s);
        let before_end = self.end_version.as_ref().map_or(true, |e| version <= e);
        after_start && before_end
    }

    /// Whether the fixture applies to implementation `impl_name`.
    pub fn valid_for_impl(&self, impl_name: &str) -> bool {
        if contains(&self.ignore_for, impl_name) {
            return false;
        }
        self.only_on.is_empty() || contains(&self.only_on, impl_name)
    }

    pub fn todo(&self, impl_name: &str) -> bool {
        contains(&self.todo, impl_name)
    }

    pub fn warning_todo(&self, impl_name: &str) -> bool {
        contains(&self.warning_todo, impl_name)
    }

    pub fn ignore(&self, impl_name: &str) -> bool {
        contains(&self.ignore_for, impl_name)
    }

    pub fn ignore_warning(&self, impl_name: &str) -> bool {
        contains(&self.ignore_warning_for, impl_name)
    }
}

/// Directories whose `options.yml` apply to `fixture_dir`, outermost first.
fn options_chain(fixture_dir: &Path, spec_root: &Path) -> Vec<PathBuf> {
    if !fixture_dir.starts_with(spec_root) {
        return vec![fixture_dir.to_path_buf()];
    }

    let mut chain: Vec<PathBuf> = fixture_dir
        .ancestors()
        .take_while(|dir| dir.starts_with(spec_root))
        .map(Path::to_path_buf)
        .collect();
    chain.reverse();
    chain
}

pub(crate) fn default_name(fixture_dir: &Path, spec_root: &Path) -> String {
    match fixture_dir.strip_prefix(spec_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => fixture_dir.display().to_string(),
    }
}

fn read_options<S>(store: &S, path: &Path) -> Result<OptionsFile, MetadataError>
where
    S: FixtureStore + ?Sized,
{
    let bytes = store.read_bytes(path).map_err(|source| MetadataError::Read {
        path: display(path),
        source,
    })?;
    parse_options(&String::from_utf8_lossy(&bytes), &display(path))
}

fn parse_options(yaml: &str, path: &str) -> Result<OptionsFile, MetadataError> {
    let body = yaml.trim();
    if body.is_empty() || body == "---" {
        return Ok(OptionsFile::default());
    }
    let parsed: Option<OptionsFile> =
        serde_yaml::from_str(yaml).map_err(|source| MetadataError::Yaml {
            path: path.to_string(),
            source,
        })?;
    let mut options = parsed.unwrap_or_default();

    for caps in BARE_VERSION.captures_iter(yaml) {
        let slot = match &caps[1] {
            "start_version" => &mut options.start_version,
            _ => &mut options.end_version,
        };
        if matches!(slot, Some(serde_yaml::Value::Number(_))) {
            *slot = Some(serde_yaml::Value::String(caps[2].to_string()));
        }
    }

    Ok(options)
}

fn parse_precision(raw: &serde_yaml::Value) -> u32 {
    raw.as_u64()
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(DEFAULT_PRECISION)
}

/// Versions may be written quoted (`'3.5'`) or as bare YAML numbers (`3.5`).
/// Bare numbers normally arrive here already restored to their source text.
fn parse_version(raw: &serde_yaml::Value, source: &Path) -> Result<Version, MetadataError> {
    let text = match raw {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => format!("{:?}", other),
    };
    coerce_version(&text).ok_or_else(|| MetadataError::InvalidVersion {
        path: display(source),
        value: text,
    })
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn contains(list: &[String], impl_name: &str) -> bool {
    list.iter().any(|i| i == impl_name)
}
