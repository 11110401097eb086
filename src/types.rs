//! # Type Mapper
//!
//! Maps a MySQL data-type keyword plus nullability, signedness and the run-wide
//! [`NullPolicy`] onto a Go type.
//!
//! Types are carried as a tagged [`GoType`] instead of a type-name string, so later stages
//! (pointer promotion, empty-value literals, conversion snippets) inspect the shape directly
//! and only the final documents render the Go spelling through [`std::fmt::Display`].
//!
//! | keyword family | plain | sql null | guregu null |
//! |----------------|-------|----------|-------------|
//! | `tinyint`, `smallint`, `mediumint` | `int32` / `uint32` / `bool` | `sql.NullInt32` / `sql.NullBool` | `null.Int` / `null.Bool` |
//! | `int`, `integer` | `int` / `uint` | `sql.NullInt64` | `null.Int` |
//! | `bigint` | `int64` / `uint64` | `sql.NullInt64` | `null.Int` |
//! | string family | `string` | `sql.NullString` | `null.String` |
//! | temporal | `time.Time` | `sql.NullTime` | `null.Time` |
//! | `float` | `float32` | `sql.NullFloat64` | `null.Float` |
//! | `double`, `real`, `decimal`, `numeric` | `float64` | `sql.NullFloat64` | `null.Float` |
//! | binary | `[]byte` | `[]byte` | `[]byte` |
//!
//! Anything else maps to [`GoType::Unknown`], rendered as `unknown` so the anomaly shows up
//! in the generated source instead of aborting the run.

use std::fmt;

/// Placeholder rendered for unrecognized data types.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Integer keywords that map to 32-bit integers.
pub const SMALL_INT_TYPES: &[&str] = &["tinyint", "smallint", "mediumint"];
/// Integer keywords that map to the platform int.
pub const INT_TYPES: &[&str] = &["int", "integer"];
/// String-like keywords.
pub const STRING_TYPES: &[&str] = &[
    "json", "enum", "set", "char", "varchar", "tinytext", "text", "mediumtext", "longtext",
];
/// Temporal keywords.
pub const TIME_TYPES: &[&str] = &["year", "date", "datetime", "time", "timestamp"];
/// Double precision keywords.
pub const DOUBLE_TYPES: &[&str] = &["double", "real", "decimal", "numeric"];
/// Binary keywords.
pub const BINARY_TYPES: &[&str] = &[
    "bit", "binary", "varbinary", "tinyblob", "blob", "mediumblob", "longblob",
];

/// Every keyword [`map_type`] recognizes.
pub fn known_data_types() -> impl Iterator<Item = &'static str> {
    SMALL_INT_TYPES
        .iter()
        .chain(INT_TYPES)
        .chain(["bigint"].iter())
        .chain(STRING_TYPES)
        .chain(TIME_TYPES)
        .chain(["float"].iter())
        .chain(DOUBLE_TYPES)
        .chain(BINARY_TYPES)
        .copied()
}

/// How nullable columns are represented for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Nullable columns keep the plain scalar type.
    #[default]
    Plain,
    /// `database/sql` null wrappers (`sql.NullString`, ...).
    SqlNull,
    /// `gopkg.in/guregu/null.v4` wrappers (`null.String`, ...).
    GureguNull,
}

impl NullPolicy {
    /// Import path the wrapper family needs, if any.
    pub fn import_path(self) -> Option<&'static str> {
        match self {
            NullPolicy::Plain => None,
            NullPolicy::SqlNull => Some("database/sql"),
            NullPolicy::GureguNull => Some("gopkg.in/guregu/null.v4"),
        }
    }
}

/// Plain Go scalar and well-known library types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Int,
    Int32,
    Int64,
    Uint,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Time,
    Bytes,
    /// `map[string]interface{}`, the API-facing shape of JSON columns.
    JsonMap,
    /// `datatypes.JSON` from `gorm.io/datatypes`.
    DataTypesJson,
    /// `gorm.DeletedAt`.
    DeletedAt,
}

impl Scalar {
    /// Go spelling of the scalar.
    pub fn as_str(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Int => "int",
            Scalar::Int32 => "int32",
            Scalar::Int64 => "int64",
            Scalar::Uint => "uint",
            Scalar::Uint32 => "uint32",
            Scalar::Uint64 => "uint64",
            Scalar::Float32 => "float32",
            Scalar::Float64 => "float64",
            Scalar::String => "string",
            Scalar::Time => "time.Time",
            Scalar::Bytes => "[]byte",
            Scalar::JsonMap => "map[string]interface{}",
            Scalar::DataTypesJson => "datatypes.JSON",
            Scalar::DeletedAt => "gorm.DeletedAt",
        }
    }

    /// Shape of the scalar itself.
    pub fn shape(self) -> TypeShape {
        match self {
            Scalar::Bytes | Scalar::DataTypesJson => TypeShape::Collection,
            Scalar::JsonMap => TypeShape::Map,
            _ => TypeShape::Scalar,
        }
    }

    /// Collections and maps already encode absence as `nil`.
    pub fn is_reference(self) -> bool {
        matches!(self.shape(), TypeShape::Collection | TypeShape::Map)
    }

    /// Signed spelling of an unsigned integer.
    pub fn signed(self) -> Scalar {
        match self {
            Scalar::Uint => Scalar::Int,
            Scalar::Uint32 => Scalar::Int32,
            Scalar::Uint64 => Scalar::Int64,
            other => other,
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Scalar::Uint | Scalar::Uint32 | Scalar::Uint64)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Scalar::Int | Scalar::Int32 | Scalar::Int64 | Scalar::Uint | Scalar::Uint32 | Scalar::Uint64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Float32 | Scalar::Float64)
    }

    /// Go zero-value literal.
    pub fn empty_literal(self) -> &'static str {
        match self {
            Scalar::String => "\"\"",
            Scalar::Bool => "false",
            Scalar::Time => "time.Now()",
            Scalar::Bytes | Scalar::JsonMap | Scalar::DataTypesJson => "nil",
            Scalar::DeletedAt => "gorm.DeletedAt{}",
            s if s.is_integer() || s.is_float() => "0",
            _ => "nil",
        }
    }
}

/// `database/sql` null wrapper kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNull {
    Bool,
    Int32,
    Int64,
    Float64,
    String,
    Time,
}

/// guregu null wrapper kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GureguNull {
    Bool,
    Int,
    Float,
    String,
    Time,
}

/// Coarse structure of a type, used by pointer promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Scalar,
    Pointer,
    Collection,
    Map,
    Wrapper,
    Unknown,
}

/// A resolved Go type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoType {
    Scalar(Scalar),
    Pointer(Scalar),
    SqlNull(SqlNull),
    GureguNull(GureguNull),
    Unknown,
}

impl GoType {
    /// The underlying scalar of plain and pointer types.
    pub fn scalar(self) -> Option<Scalar> {
        match self {
            GoType::Scalar(s) | GoType::Pointer(s) => Some(s),
            _ => None,
        }
    }

    pub fn shape(self) -> TypeShape {
        match self {
            GoType::Scalar(s) => s.shape(),
            GoType::Pointer(_) => TypeShape::Pointer,
            GoType::SqlNull(_) | GoType::GureguNull(_) => TypeShape::Wrapper,
            GoType::Unknown => TypeShape::Unknown,
        }
    }

    pub fn is_pointer(self) -> bool {
        matches!(self, GoType::Pointer(_))
    }

    /// Whether the type already distinguishes absence without a pointer.
    pub fn is_reference(self) -> bool {
        matches!(self.shape(), TypeShape::Collection | TypeShape::Map)
    }

    /// Timestamps in any representation (plain, pointer or null wrapper).
    pub fn is_time(self) -> bool {
        matches!(
            self,
            GoType::Scalar(Scalar::Time)
                | GoType::Pointer(Scalar::Time)
                | GoType::SqlNull(SqlNull::Time)
                | GoType::GureguNull(GureguNull::Time)
        )
    }

    /// Whether the type is `s` or `*s`.
    pub fn is(self, s: Scalar) -> bool {
        self.scalar() == Some(s)
    }

    /// Pointer to the type. References, wrappers, unknown types and existing pointers are
    /// returned unchanged.
    pub fn to_pointer(self) -> GoType {
        match self {
            GoType::Scalar(s) if !s.is_reference() => GoType::Pointer(s),
            other => other,
        }
    }

    /// Same type with unsigned integers demoted to their signed spelling.
    pub fn strip_unsigned(self) -> GoType {
        match self {
            GoType::Scalar(s) => GoType::Scalar(s.signed()),
            GoType::Pointer(s) => GoType::Pointer(s.signed()),
            other => other,
        }
    }

    /// Go zero-value literal (`""`, `0`, `false`, `nil`, ...).
    pub fn empty_literal(self) -> &'static str {
        match self {
            GoType::Scalar(s) => s.empty_literal(),
            _ => "nil",
        }
    }

    /// Reports whether a column default carries no information beyond the zero value.
    pub fn is_default_empty(self, default: &str) -> bool {
        if default.is_empty() {
            return true;
        }
        let Some(scalar) = self.scalar() else {
            return true;
        };
        match scalar {
            Scalar::String => false,
            Scalar::Bool => default == "false" || default == "0",
            Scalar::Time => default == crate::model::CURRENT_TIMESTAMP,
            s if s.is_integer() || s.is_float() => default == "0",
            _ => true,
        }
    }
}

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoType::Scalar(s) => f.write_str(s.as_str()),
            GoType::Pointer(s) => write!(f, "*{}", s.as_str()),
            GoType::SqlNull(n) => f.write_str(match n {
                SqlNull::Bool => "sql.NullBool",
                SqlNull::Int32 => "sql.NullInt32",
                SqlNull::Int64 => "sql.NullInt64",
                SqlNull::Float64 => "sql.NullFloat64",
                SqlNull::String => "sql.NullString",
                SqlNull::Time => "sql.NullTime",
            }),
            GoType::GureguNull(n) => f.write_str(match n {
                GureguNull::Bool => "null.Bool",
                GureguNull::Int => "null.Int",
                GureguNull::Float => "null.Float",
                GureguNull::String => "null.String",
                GureguNull::Time => "null.Time",
            }),
            GoType::Unknown => f.write_str(UNKNOWN_TYPE),
        }
    }
}

/// Pick the wrapper for a nullable column, or the plain scalar.
fn wrap(nullable: bool, policy: NullPolicy, sql: SqlNull, guregu: GureguNull, plain: Scalar) -> GoType {
    if nullable {
        match policy {
            NullPolicy::GureguNull => return GoType::GureguNull(guregu),
            NullPolicy::SqlNull => return GoType::SqlNull(sql),
            NullPolicy::Plain => {}
        }
    }
    GoType::Scalar(plain)
}

/// Map a data-type keyword to a Go type.
///
/// `is_bool` marks a small integer column that should surface as a boolean (see
/// [`crate::catalog::ColumnDescriptor::is_bool_column`]). The keyword is matched
/// case-insensitively; unknown keywords yield [`GoType::Unknown`].
pub fn map_type(data_type: &str, nullable: bool, unsigned: bool, is_bool: bool, policy: NullPolicy) -> GoType {
    let keyword = data_type.trim().to_ascii_lowercase();
    let keyword = keyword.as_str();

    if SMALL_INT_TYPES.contains(&keyword) {
        if is_bool {
            return wrap(nullable, policy, SqlNull::Bool, GureguNull::Bool, Scalar::Bool);
        }
        let plain = if unsigned { Scalar::Uint32 } else { Scalar::Int32 };
        return wrap(nullable, policy, SqlNull::Int32, GureguNull::Int, plain);
    }
    if INT_TYPES.contains(&keyword) {
        let plain = if unsigned { Scalar::Uint } else { Scalar::Int };
        return wrap(nullable, policy, SqlNull::Int64, GureguNull::Int, plain);
    }
    if keyword == "bigint" {
        let plain = if unsigned { Scalar::Uint64 } else { Scalar::Int64 };
        return wrap(nullable, policy, SqlNull::Int64, GureguNull::Int, plain);
    }
    if STRING_TYPES.contains(&keyword) {
        return wrap(nullable, policy, SqlNull::String, GureguNull::String, Scalar::String);
    }
    if TIME_TYPES.contains(&keyword) {
        return wrap(nullable, policy, SqlNull::Time, GureguNull::Time, Scalar::Time);
    }
    if keyword == "float" {
        return wrap(nullable, policy, SqlNull::Float64, GureguNull::Float, Scalar::Float32);
    }
    if DOUBLE_TYPES.contains(&keyword) {
        return wrap(nullable, policy, SqlNull::Float64, GureguNull::Float, Scalar::Float64);
    }
    if BINARY_TYPES.contains(&keyword) {
        return GoType::Scalar(Scalar::Bytes);
    }

    tracing::warn!(data_type, "unrecognized data type, emitting `{UNKNOWN_TYPE}`");
    GoType::Unknown
}
