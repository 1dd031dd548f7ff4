//! Canonical type resolution
//!
//! Raw field-type spellings are open-ended (`int`, `Integer`, `BigInt`,
//! `java.time.LocalDate`, `varchar(80)?` ...). They all map into the small
//! fixed [`CanonicalType`] set. Everything downstream (storage fragments, cast
//! directives, SQL types, filter operators) is a lookup against the canonical
//! type, never against the raw spelling.
//!
//! Lookup tables live in an explicit [`TypeCatalog`] value built per flavor,
//! so several catalogs can coexist in one process.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::Flavor;

/// The fixed canonical type set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalType {
    String,
    Text,
    Integer,
    BigInteger,
    SmallInteger,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Json,
    Binary,
    Uuid,
    Enum,
}

impl CanonicalType {
    pub const ALL: [CanonicalType; 14] = [
        CanonicalType::String,
        CanonicalType::Text,
        CanonicalType::Integer,
        CanonicalType::BigInteger,
        CanonicalType::SmallInteger,
        CanonicalType::Decimal,
        CanonicalType::Boolean,
        CanonicalType::Date,
        CanonicalType::Time,
        CanonicalType::DateTime,
        CanonicalType::Json,
        CanonicalType::Binary,
        CanonicalType::Uuid,
        CanonicalType::Enum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::String => "string",
            CanonicalType::Text => "text",
            CanonicalType::Integer => "integer",
            CanonicalType::BigInteger => "bigInteger",
            CanonicalType::SmallInteger => "smallInteger",
            CanonicalType::Decimal => "decimal",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Date => "date",
            CanonicalType::Time => "time",
            CanonicalType::DateTime => "datetime",
            CanonicalType::Json => "json",
            CanonicalType::Binary => "binary",
            CanonicalType::Uuid => "uuid",
            CanonicalType::Enum => "enum",
        }
    }

    /// Operator class used by search/filter generation
    pub fn comparison_class(&self) -> Option<ComparisonClass> {
        match self {
            CanonicalType::Integer
            | CanonicalType::BigInteger
            | CanonicalType::SmallInteger
            | CanonicalType::Decimal => Some(ComparisonClass::Numeric),
            CanonicalType::String
            | CanonicalType::Text
            | CanonicalType::Uuid
            | CanonicalType::Enum => Some(ComparisonClass::String),
            CanonicalType::Date | CanonicalType::Time | CanonicalType::DateTime => {
                Some(ComparisonClass::Temporal)
            }
            CanonicalType::Boolean | CanonicalType::Json | CanonicalType::Binary => None,
        }
    }

    /// Portable SQL column type
    pub fn sql_equivalent(&self) -> &'static str {
        match self {
            CanonicalType::String => "VARCHAR(255)",
            CanonicalType::Text => "TEXT",
            CanonicalType::Integer => "INTEGER",
            CanonicalType::BigInteger => "BIGINT",
            CanonicalType::SmallInteger => "SMALLINT",
            CanonicalType::Decimal => "DECIMAL(10,2)",
            CanonicalType::Boolean => "BOOLEAN",
            CanonicalType::Date => "DATE",
            CanonicalType::Time => "TIME",
            CanonicalType::DateTime => "TIMESTAMP",
            CanonicalType::Json => "JSON",
            CanonicalType::Binary => "BLOB",
            CanonicalType::Uuid => "UUID",
            CanonicalType::Enum => "VARCHAR(255)",
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.comparison_class() == Some(ComparisonClass::Numeric)
    }

    /// Check a declared default against this type
    ///
    /// Enum membership is checked by the caller, which knows the values.
    pub fn check_default(&self, value: &str) -> Result<(), String> {
        match self {
            CanonicalType::Boolean => match value.to_lowercase().as_str() {
                "true" | "false" | "1" | "0" | "yes" | "no" => Ok(()),
                _ => Err(format!("'{}' is not a boolean", value)),
            },
            CanonicalType::Integer | CanonicalType::BigInteger | CanonicalType::SmallInteger => value
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("'{}' is not an integer", value)),
            CanonicalType::Decimal => match value.parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(()),
                _ => Err(format!("'{}' is not a number", value)),
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison-operator class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonClass {
    Numeric,
    String,
    Temporal,
}

impl ComparisonClass {
    /// Operators offered for fields of this class
    pub fn operators(&self) -> &'static [&'static str] {
        match self {
            ComparisonClass::Numeric => &["eq", "ne", "gt", "gte", "lt", "lte", "between", "in"],
            ComparisonClass::String => &["eq", "ne", "contains", "starts_with", "ends_with", "in"],
            ComparisonClass::Temporal => &["eq", "before", "after", "between"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonClass::Numeric => "numeric",
            ComparisonClass::String => "string",
            ComparisonClass::Temporal => "temporal",
        }
    }
}

/// Outcome of resolving one raw spelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeResolution {
    pub canonical: CanonicalType,
    /// False when the spelling was unknown and defaulted to `string`
    pub recognized: bool,
    /// Parenthesised arguments, e.g. enum values or precision
    pub args: Vec<String>,
}

static BUILTIN_SYNONYMS: Lazy<BTreeMap<&'static str, CanonicalType>> = Lazy::new(|| {
    use CanonicalType::*;
    let table: &[(&[&str], CanonicalType)] = &[
        (
            &[
                "string", "str", "varchar", "char", "character", "nvarchar", "email", "url",
                "password", "phone",
            ],
            String,
        ),
        (&["text", "longtext", "mediumtext", "clob"], Text),
        (&["int", "integer", "int32", "number"], Integer),
        (&["long", "bigint", "biginteger", "int64"], BigInteger),
        (
            &["short", "smallint", "smallinteger", "tinyint", "int16", "byte"],
            SmallInteger,
        ),
        (
            &[
                "decimal", "numeric", "float", "double", "real", "money", "bigdecimal",
            ],
            Decimal,
        ),
        (&["bool", "boolean", "bit"], Boolean),
        (&["date", "localdate"], Date),
        (&["time", "localtime"], Time),
        (
            &[
                "datetime", "timestamp", "timestamptz", "instant", "localdatetime",
                "zoneddatetime", "offsetdatetime",
            ],
            DateTime,
        ),
        (&["json", "jsonb", "object", "map", "array"], Json),
        (&["binary", "blob", "bytes", "bytea", "varbinary"], Binary),
        (&["uuid", "guid"], Uuid),
        (&["enum", "enumeration"], Enum),
    ];
    table
        .iter()
        .flat_map(|(spellings, ty)| spellings.iter().map(move |s| (*s, *ty)))
        .collect()
});

/// Explicit type lookup context for one flavor
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    flavor: Flavor,
    synonyms: BTreeMap<String, CanonicalType>,
}

impl TypeCatalog {
    /// Catalog with the built-in synonym table
    pub fn for_flavor(flavor: Flavor) -> Self {
        Self {
            flavor,
            synonyms: BUILTIN_SYNONYMS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    /// Add or override a spelling
    pub fn with_synonym(mut self, spelling: &str, canonical: CanonicalType) -> Self {
        self.synonyms.insert(normalize(spelling), canonical);
        self
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Resolve a raw spelling; unknown spellings become `string`
    pub fn resolve(&self, raw_type: &str) -> CanonicalType {
        self.resolve_spelling(raw_type).canonical
    }

    /// Resolve a raw spelling, reporting whether it was recognised
    pub fn resolve_spelling(&self, raw_type: &str) -> TypeResolution {
        let args = type_args(raw_type);
        match self.synonyms.get(&normalize(raw_type)) {
            Some(canonical) => TypeResolution {
                canonical: *canonical,
                recognized: true,
                args,
            },
            None => TypeResolution {
                canonical: CanonicalType::String,
                recognized: false,
                args,
            },
        }
    }

    /// Storage/migration fragment for a column of this type
    pub fn migration_fragment(&self, ty: CanonicalType, field: &str) -> String {
        match self.flavor {
            Flavor::Laravel => {
                let method = match ty {
                    CanonicalType::String | CanonicalType::Enum => "string",
                    CanonicalType::Text => "text",
                    CanonicalType::Integer => "integer",
                    CanonicalType::BigInteger => "bigInteger",
                    CanonicalType::SmallInteger => "smallInteger",
                    CanonicalType::Decimal => {
                        return format!("$table->decimal('{}', 10, 2)", field);
                    }
                    CanonicalType::Boolean => "boolean",
                    CanonicalType::Date => "date",
                    CanonicalType::Time => "time",
                    CanonicalType::DateTime => "dateTime",
                    CanonicalType::Json => "json",
                    CanonicalType::Binary => "binary",
                    CanonicalType::Uuid => "uuid",
                };
                format!("$table->{}('{}')", method, field)
            }
            Flavor::SeaOrm => format!("{} {}", field, ty.sql_equivalent()),
        }
    }

    /// Storage fragment for an enum column with known values
    pub fn enum_fragment(&self, field: &str, values: &[String]) -> String {
        match self.flavor {
            Flavor::Laravel => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("$table->enum('{}', [{}])", field, quoted.join(", "))
            }
            Flavor::SeaOrm => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!(
                    "{} VARCHAR(255) CHECK ({} IN ({}))",
                    field,
                    field,
                    quoted.join(", ")
                )
            }
        }
    }

    /// Runtime cast/coercion directive
    pub fn cast_directive(&self, ty: CanonicalType) -> &'static str {
        match self.flavor {
            Flavor::Laravel => match ty {
                CanonicalType::Integer | CanonicalType::BigInteger | CanonicalType::SmallInteger => {
                    "integer"
                }
                CanonicalType::Decimal => "decimal:2",
                CanonicalType::Boolean => "boolean",
                CanonicalType::Date => "date",
                CanonicalType::DateTime => "datetime",
                CanonicalType::Json => "array",
                CanonicalType::String
                | CanonicalType::Text
                | CanonicalType::Time
                | CanonicalType::Binary
                | CanonicalType::Uuid
                | CanonicalType::Enum => "string",
            },
            Flavor::SeaOrm => match ty {
                CanonicalType::String | CanonicalType::Text | CanonicalType::Enum => "String",
                CanonicalType::Integer => "i32",
                CanonicalType::BigInteger => "i64",
                CanonicalType::SmallInteger => "i16",
                CanonicalType::Decimal => "Decimal",
                CanonicalType::Boolean => "bool",
                CanonicalType::Date => "Date",
                CanonicalType::Time => "Time",
                CanonicalType::DateTime => "DateTimeUtc",
                CanonicalType::Json => "Json",
                CanonicalType::Binary => "Vec<u8>",
                CanonicalType::Uuid => "Uuid",
            },
        }
    }

    /// Portable SQL column type
    pub fn sql_equivalent(&self, ty: CanonicalType) -> &'static str {
        ty.sql_equivalent()
    }
}

/// Reduce a raw spelling to its lookup key
///
/// `Optional` markers and arguments are dropped, a qualified name keeps only
/// its last segment, and case, `_`, `-` and whitespace are ignored.
pub fn normalize(raw_type: &str) -> String {
    let base = raw_type.trim().trim_end_matches('?');
    let base = match base.find('(') {
        Some(idx) => &base[..idx],
        None => base,
    };
    let base = base.rsplit('.').next().unwrap_or(base);
    base.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parenthesised arguments of a raw spelling: `enum(a, b)` → `["a", "b"]`
pub fn type_args(raw_type: &str) -> Vec<String> {
    let Some(open) = raw_type.find('(') else {
        return Vec::new();
    };
    let Some(close) = raw_type.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    raw_type[open + 1..close]
        .split(',')
        .map(|a| a.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_family() {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        assert_eq!(catalog.resolve("int"), CanonicalType::Integer);
        assert_eq!(catalog.resolve("Integer"), CanonicalType::Integer);
        assert_eq!(catalog.resolve("long"), CanonicalType::BigInteger);
        assert_eq!(catalog.resolve("BigInt"), CanonicalType::BigInteger);
        assert_eq!(catalog.resolve("short"), CanonicalType::SmallInteger);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize("decimal(10,2)?"), "decimal");
        assert_eq!(normalize("java.time.LocalDate"), "localdate");
        assert_eq!(normalize("Big_Integer"), "biginteger");
        assert_eq!(normalize("date-time"), "datetime");
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        assert_eq!(catalog.resolve("java.time.LocalDate"), CanonicalType::Date);
        assert_eq!(catalog.resolve("varchar(80)?"), CanonicalType::String);
        assert_eq!(catalog.resolve("TIMESTAMP"), CanonicalType::DateTime);
    }

    #[test]
    fn test_unknown_defaults_to_string() {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let resolution = catalog.resolve_spelling("picture");
        assert_eq!(resolution.canonical, CanonicalType::String);
        assert!(!resolution.recognized);
        assert!(catalog.resolve_spelling("string").recognized);
    }

    #[test]
    fn test_enum_args() {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let resolution = catalog.resolve_spelling("enum(draft, \"published\")");
        assert_eq!(resolution.canonical, CanonicalType::Enum);
        assert_eq!(resolution.args, vec!["draft".to_string(), "published".to_string()]);
        assert!(type_args("string").is_empty());
    }

    #[test]
    fn test_with_synonym() {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel)
            .with_synonym("Money_Amount", CanonicalType::Decimal);
        assert_eq!(catalog.resolve("moneyamount"), CanonicalType::Decimal);
        // Catalogs are independent values
        let plain = TypeCatalog::for_flavor(Flavor::Laravel);
        assert_eq!(plain.resolve("moneyamount"), CanonicalType::String);
    }

    #[test]
    fn test_laravel_lookups() {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        assert_eq!(
            catalog.migration_fragment(CanonicalType::Decimal, "total"),
            "$table->decimal('total', 10, 2)"
        );
        assert_eq!(
            catalog.migration_fragment(CanonicalType::BigInteger, "views"),
            "$table->bigInteger('views')"
        );
        assert_eq!(catalog.cast_directive(CanonicalType::Decimal), "decimal:2");
        assert_eq!(catalog.cast_directive(CanonicalType::Json), "array");
        assert_eq!(
            catalog.enum_fragment("status", &["ACTIVE".to_string(), "SUSPENDED".to_string()]),
            "$table->enum('status', ['ACTIVE', 'SUSPENDED'])"
        );
    }

    #[test]
    fn test_seaorm_lookups() {
        let catalog = TypeCatalog::for_flavor(Flavor::SeaOrm);
        assert_eq!(
            catalog.migration_fragment(CanonicalType::Decimal, "total"),
            "total DECIMAL(10,2)"
        );
        assert_eq!(catalog.cast_directive(CanonicalType::DateTime), "DateTimeUtc");
        assert_eq!(catalog.sql_equivalent(CanonicalType::Uuid), "UUID");
    }

    #[test]
    fn test_check_default() {
        assert!(CanonicalType::Integer.check_default("42").is_ok());
        assert!(CanonicalType::Integer.check_default("abc").is_err());
        assert!(CanonicalType::Integer.check_default("1.5").is_err());
        assert!(CanonicalType::Decimal.check_default("9.99").is_ok());
        assert!(CanonicalType::Decimal.check_default("NaN").is_err());
        assert!(CanonicalType::Boolean.check_default("Yes").is_ok());
        assert!(CanonicalType::Boolean.check_default("maybe").is_err());
        assert!(CanonicalType::String.check_default("anything").is_ok());
    }

    #[test]
    fn test_comparison_classes() {
        assert_eq!(
            CanonicalType::Decimal.comparison_class(),
            Some(ComparisonClass::Numeric)
        );
        assert_eq!(
            CanonicalType::Uuid.comparison_class(),
            Some(ComparisonClass::String)
        );
        assert_eq!(
            CanonicalType::Time.comparison_class(),
            Some(ComparisonClass::Temporal)
        );
        assert_eq!(CanonicalType::Json.comparison_class(), None);
        assert!(ComparisonClass::Temporal.operators().contains(&"before"));
    }

    #[test]
    fn test_every_canonical_type_has_lookups() {
        for flavor in Flavor::ALL {
            let catalog = TypeCatalog::for_flavor(flavor);
            for ty in CanonicalType::ALL {
                assert!(!catalog.migration_fragment(ty, "f").is_empty());
                assert!(!catalog.cast_directive(ty).is_empty());
                assert!(!catalog.sql_equivalent(ty).is_empty());
            }
        }
    }
}
