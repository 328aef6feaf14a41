use std::fmt;

use chrono::{DateTime, Utc};
use orb_types::RowIndex;
use serde::{Deserialize, Serialize};

/// Handle to one table inside a backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey(pub usize);

impl fmt::Debug for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableKey({})", self.0)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Declared type of a table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    Double,
    String,
    Binary,
    /// Legacy mixed column. Created for schema compatibility; never written.
    Mixed,
    Date,
    /// Nullable link into the target table.
    Link(TableKey),
    /// Ordered list of links into the target table.
    LinkList(TableKey),
}

impl ColumnType {
    /// Value a freshly allocated row holds in a column of this type.
    pub fn default_value(&self) -> ColumnValue {
        match self {
            Self::Bool => ColumnValue::Bool(false),
            Self::Int => ColumnValue::Int(0),
            Self::Float => ColumnValue::Float(0.0),
            Self::Double => ColumnValue::Double(0.0),
            Self::String => ColumnValue::String(String::new()),
            Self::Binary => ColumnValue::Binary(Vec::new()),
            Self::Mixed => ColumnValue::Null,
            Self::Date => ColumnValue::Date(DateTime::<Utc>::default()),
            Self::Link(_) => ColumnValue::Link(None),
            Self::LinkList(_) => ColumnValue::LinkList(Vec::new()),
        }
    }

    /// Target table of a link or link-list column.
    pub fn link_target(&self) -> Option<TableKey> {
        match self {
            Self::Link(t) | Self::LinkList(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns `true` if `value` may be stored in a column of this type.
    pub fn accepts(&self, value: &ColumnValue) -> bool {
        matches!(
            (self, value),
            (Self::Bool, ColumnValue::Bool(_))
                | (Self::Int, ColumnValue::Int(_))
                | (Self::Float, ColumnValue::Float(_))
                | (Self::Double, ColumnValue::Double(_))
                | (Self::String, ColumnValue::String(_))
                | (Self::Binary, ColumnValue::Binary(_))
                | (Self::Date, ColumnValue::Date(_))
                | (Self::Link(_), ColumnValue::Link(_))
                | (Self::LinkList(_), ColumnValue::LinkList(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::Binary => write!(f, "binary"),
            Self::Mixed => write!(f, "mixed"),
            Self::Date => write!(f, "date"),
            Self::Link(t) => write!(f, "link<{t}>"),
            Self::LinkList(t) => write!(f, "linklist<{t}>"),
        }
    }
}

/// Contents of one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Date(DateTime<Utc>),
    Link(Option<RowIndex>),
    LinkList(Vec<RowIndex>),
}

impl ColumnValue {
    /// Short type name used in mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::Date(_) => "date",
            Self::Link(_) => "link",
            Self::LinkList(_) => "linklist",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<RowIndex> {
        match self {
            Self::Link(link) => *link,
            _ => None,
        }
    }

    pub fn as_link_list(&self) -> Option<&[RowIndex]> {
        match self {
            Self::LinkList(links) => Some(links),
            _ => None,
        }
    }
}
