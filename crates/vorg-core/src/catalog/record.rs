//! File records and their dynamically typed field values

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A single column value of a catalogued file, as stored by SQLite.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value.
    ///
    /// Integers and reals convert directly; text is accepted when it parses
    /// as an integer or a float. Everything else is unavailable.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .map(|i| i as f64)
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok())
            }
            Self::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(i) => write!(f, "{i}"),
            // Whole reals keep one decimal so `1.0` never reads like an integer column
            Self::Real(r) if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e16 => {
                write!(f, "{r:.1}")
            }
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One catalogued file.
///
/// The well-known scanner columns are typed; any other column of the
/// `files` table is kept in `extras` under its column name. Every optional
/// column tolerates NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub extension: Option<String>,
    pub size: Option<i64>,
    pub created: Option<f64>,
    pub modified: Option<f64>,
    pub accessed: Option<f64>,
    pub hash_sha256: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Option<String>,
    pub extras: BTreeMap<String, FieldValue>,
}

impl FileRecord {
    /// Create a record for `path`, deriving `name` and `extension` from it.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let file_path = Path::new(&path);
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));

        Self {
            name,
            extension,
            path,
            ..Self::default()
        }
    }

    /// Builder-style [`set_field`](Self::set_field).
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set_field(name, value.into());
        self
    }

    /// Look up a field by column name.
    ///
    /// Returns `None` when the column is absent or NULL for a typed column.
    /// `hash` is accepted as an alias for `hash_sha256`.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let real = |v: &Option<f64>| v.map(FieldValue::Real);

        match name {
            "path" => Some(FieldValue::Text(self.path.clone())),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "extension" => text(&self.extension),
            "size" => self.size.map(FieldValue::Integer),
            "created" => real(&self.created),
            "modified" => real(&self.modified),
            "accessed" => real(&self.accessed),
            "hash" | "hash_sha256" => text(&self.hash_sha256),
            "category" => text(&self.category),
            "subcategory" => text(&self.subcategory),
            "tags" => text(&self.tags),
            other => self.extras.get(other).cloned(),
        }
    }

    /// Set a field by column name, coercing into the typed slot when the
    /// column is a well-known one.
    pub fn set_field(&mut self, name: &str, value: FieldValue) {
        let text = match &value {
            FieldValue::Null => None,
            other => Some(other.to_string()),
        };
        let number = value.as_number();

        match name {
            "path" => self.path = text.unwrap_or_default(),
            "name" => self.name = text.unwrap_or_default(),
            "extension" => self.extension = text,
            "size" => self.size = number.map(|n| n as i64),
            "created" => self.created = number,
            "modified" => self.modified = number,
            "accessed" => self.accessed = number,
            "hash" | "hash_sha256" => self.hash_sha256 = text,
            "category" => self.category = text,
            "subcategory" => self.subcategory = text,
            "tags" => self.tags = text,
            other => {
                self.extras.insert(other.to_string(), value);
            }
        }
    }
}
