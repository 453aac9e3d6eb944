//! Configuration sources.
//!
//! A [`Provider`] produces one flat key/value mapping per resolution pass.
//! The built-ins cover the usual layers:
//!
//! - [`DefaultsProvider`] — `default = "..."` annotations from the record type
//! - [`FileProvider`] — a JSON, TOML, or `.env` file
//! - [`EnvProvider`] — the process environment
//! - [`MapProvider`] — an explicit in-memory map
//!
//! Stack them lowest-priority first; the merger gives later providers the
//! last word.

use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::coerce::FromValue;
use crate::error::HotfigError;
use crate::keymap::{screaming_snake, KeyMapper, ScreamingSnake};
use crate::record::{FieldMeta, FieldVisitor, Record};
use crate::value::{FlatMap, Value};

/// A source of flat configuration key/value pairs.
pub trait Provider: Send + Sync {
    /// Produce this source's key/value pairs. Failure aborts the whole
    /// resolution pass.
    fn values(&self) -> Result<FlatMap, HotfigError>;

    /// Whether this source's keys already carry the configured prefix.
    ///
    /// The merger prepends `<PREFIX>_` to the output of providers returning
    /// `false`. The process environment returns `true`: its keys are written
    /// by the operator in prefixed form, and an unprefixed variable must stay
    /// invisible when a prefix is configured.
    fn is_prefix_aware(&self) -> bool {
        false
    }
}

/// The process environment. Prefix-aware: keys pass through as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProvider;

impl Provider for EnvProvider {
    fn values(&self) -> Result<FlatMap, HotfigError> {
        Ok(std::env::vars()
            .map(|(key, value)| (key, Value::Str(value)))
            .collect())
    }

    fn is_prefix_aware(&self) -> bool {
        true
    }
}

/// An explicit key/value map, handy for tests and programmatic overrides.
#[derive(Debug, Clone, Default)]
pub struct MapProvider {
    values: FlatMap,
}

impl MapProvider {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl Provider for MapProvider {
    fn values(&self) -> Result<FlatMap, HotfigError> {
        Ok(self.values.clone())
    }
}

/// A configuration file: JSON and TOML by extension, `.env` line syntax
/// otherwise. A missing file yields an empty mapping, so a layered stack can
/// list optional files without guarding their existence.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        Self { path }
    }
}

impl Provider for FileProvider {
    fn values(&self) -> Result<FlatMap, HotfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FlatMap::new()),
            Err(err) => {
                return Err(HotfigError::Io {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };

        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => flatten_json(&content, &self.path),
            Some("toml") => flatten_toml(&content, &self.path),
            _ => Ok(parse_env_lines(&content)),
        }
    }
}

fn format_error(path: &Path, reason: impl ToString) -> HotfigError {
    HotfigError::FileFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Flatten a JSON document into canonical keys: nested objects join their
/// (snake-mapped) key segments with `_`, exactly like nested record fields.
fn flatten_json(content: &str, path: &Path) -> Result<FlatMap, HotfigError> {
    let root: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format_error(path, e))?;
    let serde_json::Value::Object(object) = root else {
        return Err(format_error(path, "top-level value must be an object"));
    };

    let mut out = FlatMap::new();
    flatten_json_object("", &object, &mut out, path)?;
    Ok(out)
}

fn flatten_json_object(
    prefix: &str,
    object: &serde_json::Map<String, serde_json::Value>,
    out: &mut FlatMap,
    path: &Path,
) -> Result<(), HotfigError> {
    for (name, value) in object {
        let key = join_key(prefix, name);
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::Object(nested) => {
                flatten_json_object(&key, nested, out, path)?;
            }
            serde_json::Value::Array(items) => {
                let seq = items
                    .iter()
                    .map(|item| json_scalar(item).ok_or_else(|| {
                        format_error(path, format!("unsupported nested value in array '{key}'"))
                    }))
                    .collect::<Result<Vec<_>, _>>()?;
                out.insert(key, Value::Seq(seq));
            }
            scalar => {
                let value = json_scalar(scalar)
                    .ok_or_else(|| format_error(path, format!("unsupported value at '{key}'")))?;
                out.insert(key, value);
            }
        }
    }
    Ok(())
}

fn json_scalar(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::Str(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        _ => None,
    }
}

fn flatten_toml(content: &str, path: &Path) -> Result<FlatMap, HotfigError> {
    let root: toml::Table = content.parse().map_err(|e| format_error(path, e))?;
    let mut out = FlatMap::new();
    flatten_toml_table("", &root, &mut out, path)?;
    Ok(out)
}

fn flatten_toml_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut FlatMap,
    path: &Path,
) -> Result<(), HotfigError> {
    for (name, value) in table {
        let key = join_key(prefix, name);
        match value {
            toml::Value::Table(nested) => {
                flatten_toml_table(&key, nested, out, path)?;
            }
            toml::Value::Array(items) => {
                let seq = items
                    .iter()
                    .map(|item| toml_scalar(item).ok_or_else(|| {
                        format_error(path, format!("unsupported nested value in array '{key}'"))
                    }))
                    .collect::<Result<Vec<_>, _>>()?;
                out.insert(key, Value::Seq(seq));
            }
            scalar => {
                let value = toml_scalar(scalar)
                    .ok_or_else(|| format_error(path, format!("unsupported value at '{key}'")))?;
                out.insert(key, value);
            }
        }
    }
    Ok(())
}

fn toml_scalar(value: &toml::Value) -> Option<Value> {
    match value {
        toml::Value::String(s) => Some(Value::Str(s.clone())),
        toml::Value::Integer(i) => Some(Value::Int(*i)),
        toml::Value::Float(f) => Some(Value::Float(*f)),
        toml::Value::Boolean(b) => Some(Value::Bool(*b)),
        toml::Value::Datetime(dt) => Some(Value::Str(dt.to_string())),
        _ => None,
    }
}

fn join_key(prefix: &str, name: &str) -> String {
    let segment = screaming_snake(name);
    if prefix.is_empty() {
        segment
    } else {
        format!("{prefix}_{segment}")
    }
}

/// `.env` line syntax: `KEY=value`, `#` comments, optional `export` prefix,
/// matching single or double quotes stripped from values. Keys are taken
/// literally, since `.env` files are written in canonical form already.
fn parse_env_lines(content: &str) -> FlatMap {
    let mut out = FlatMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), Value::Str(strip_quotes(value.trim()).to_string()));
    }

    out
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Default values declared on the record type via `default = "..."`
/// annotations, collected by walking a default-initialized instance.
///
/// Not prefix-aware: defaults are written unprefixed and the merger
/// qualifies them, nested paths included.
pub struct DefaultsProvider<T> {
    mapper: Arc<dyn KeyMapper>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> DefaultsProvider<T> {
    pub fn new() -> Self {
        Self::with_mapper(Arc::new(ScreamingSnake))
    }

    /// Use a custom mapper; pair this with [`Options::mapper`](crate::Options::mapper)
    /// so defaults land on the same keys the binder looks up.
    pub fn with_mapper(mapper: Arc<dyn KeyMapper>) -> Self {
        Self {
            mapper,
            _marker: PhantomData,
        }
    }
}

impl<T: Record> Default for DefaultsProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Provider for DefaultsProvider<T> {
    fn values(&self) -> Result<FlatMap, HotfigError> {
        let mut collector = DefaultsCollector {
            mapper: &*self.mapper,
            path: String::new(),
            out: FlatMap::new(),
        };
        T::default().visit(&mut collector)?;
        Ok(collector.out)
    }
}

struct DefaultsCollector<'a> {
    mapper: &'a dyn KeyMapper,
    path: String,
    out: FlatMap,
}

impl FieldVisitor for DefaultsCollector<'_> {
    fn leaf<F: FromValue>(
        &mut self,
        name: &str,
        meta: FieldMeta,
        _field: &mut F,
    ) -> Result<(), HotfigError> {
        if let Some(default) = meta.default {
            let key = format!("{}{}", self.path, self.mapper.field(name));
            self.out.insert(key, Value::Str(default.to_string()));
        }
        Ok(())
    }

    fn nested<R: Record>(&mut self, name: &str, record: &mut R) -> Result<(), HotfigError> {
        let saved = self.path.len();
        self.path.push_str(&self.mapper.field(name));
        self.path.push('_');
        let result = record.visit(self);
        self.path.truncate(saved);
        result
    }
}
