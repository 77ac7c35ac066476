//! Type name resolution
//!
//! Maps the type name carried by a descriptor to a [`TypeKind`]. Lookup is an
//! exact, case-sensitive match. The legacy fully qualified marshal class names
//! are accepted both with and without the single quotes drivers wrap them in.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Prefix of the legacy Cassandra marshal class names
pub const MARSHAL_PREFIX: &str = "org.apache.cassandra.db.marshal.";

/// CQL type kinds known to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Unknown,
    Ascii,
    Boolean,
    Blob,
    ColumnToCollection,
    Composite,
    Counter,
    Decimal,
    Double,
    DynamicComposite,
    Float,
    Frozen,
    Inet,
    Int,
    Varint,
    List,
    BigInt,
    Map,
    Reversed,
    Set,
    TimeUuid,
    Timestamp,
    Tuple,
    Text,
    Uuid,
    UserType,
    Varchar,
}

const SHORT_NAMES: &[(&str, TypeKind)] = &[
    ("ascii", TypeKind::Ascii),
    ("boolean", TypeKind::Boolean),
    ("blob", TypeKind::Blob),
    ("counter", TypeKind::Counter),
    ("decimal", TypeKind::Decimal),
    ("double", TypeKind::Double),
    ("float", TypeKind::Float),
    ("frozen", TypeKind::Frozen),
    ("inet", TypeKind::Inet),
    ("int", TypeKind::Int),
    ("varint", TypeKind::Varint),
    ("list", TypeKind::List),
    ("bigint", TypeKind::BigInt),
    ("map", TypeKind::Map),
    ("set", TypeKind::Set),
    ("timeuuid", TypeKind::TimeUuid),
    ("timestamp", TypeKind::Timestamp),
    ("tuple", TypeKind::Tuple),
    ("text", TypeKind::Text),
    ("uuid", TypeKind::Uuid),
    ("varchar", TypeKind::Varchar),
];

const MARSHAL_CLASSES: &[(&str, TypeKind)] = &[
    ("ColumnToCollectionType", TypeKind::ColumnToCollection),
    ("CompositeType", TypeKind::Composite),
    ("DynamicCompositeType", TypeKind::DynamicComposite),
    ("ReversedType", TypeKind::Reversed),
    ("UserType", TypeKind::UserType),
];

static TYPE_NAMES: Lazy<HashMap<String, TypeKind>> = Lazy::new(|| {
    let mut names: HashMap<String, TypeKind> = SHORT_NAMES
        .iter()
        .map(|(name, kind)| ((*name).to_string(), *kind))
        .collect();

    for (class, kind) in MARSHAL_CLASSES {
        let qualified = format!("{}{}", MARSHAL_PREFIX, class);
        names.insert(format!("'{}'", qualified), *kind);
        names.insert(qualified, *kind);
    }

    names
});

impl TypeKind {
    /// Resolve a type name; unrecognized names yield [`TypeKind::Unknown`]
    pub fn from_name(name: &str) -> Self {
        TYPE_NAMES.get(name).copied().unwrap_or(TypeKind::Unknown)
    }

    /// Canonical name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Unknown => "unknown",
            TypeKind::Ascii => "ascii",
            TypeKind::Boolean => "boolean",
            TypeKind::Blob => "blob",
            TypeKind::ColumnToCollection => "'org.apache.cassandra.db.marshal.ColumnToCollectionType'",
            TypeKind::Composite => "'org.apache.cassandra.db.marshal.CompositeType'",
            TypeKind::Counter => "counter",
            TypeKind::Decimal => "decimal",
            TypeKind::Double => "double",
            TypeKind::DynamicComposite => "'org.apache.cassandra.db.marshal.DynamicCompositeType'",
            TypeKind::Float => "float",
            TypeKind::Frozen => "frozen",
            TypeKind::Inet => "inet",
            TypeKind::Int => "int",
            TypeKind::Varint => "varint",
            TypeKind::List => "list",
            TypeKind::BigInt => "bigint",
            TypeKind::Map => "map",
            TypeKind::Reversed => "'org.apache.cassandra.db.marshal.ReversedType'",
            TypeKind::Set => "set",
            TypeKind::TimeUuid => "timeuuid",
            TypeKind::Timestamp => "timestamp",
            TypeKind::Tuple => "tuple",
            TypeKind::Text => "text",
            TypeKind::Uuid => "uuid",
            TypeKind::UserType => "'org.apache.cassandra.db.marshal.UserType'",
            TypeKind::Varchar => "varchar",
        }
    }

    /// Kinds decoded without child decoders
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeKind::Ascii
                | TypeKind::Boolean
                | TypeKind::Blob
                | TypeKind::Counter
                | TypeKind::Decimal
                | TypeKind::Double
                | TypeKind::Float
                | TypeKind::Inet
                | TypeKind::Int
                | TypeKind::Varint
                | TypeKind::BigInt
                | TypeKind::TimeUuid
                | TypeKind::Timestamp
                | TypeKind::Text
                | TypeKind::Uuid
                | TypeKind::Varchar
        )
    }

    /// Kinds whose wire framing depends on the protocol version
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeKind::List | TypeKind::Set | TypeKind::Map)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every name the resolver accepts, sorted
pub fn known_type_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TYPE_NAMES.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names() {
        assert_eq!(TypeKind::from_name("int"), TypeKind::Int);
        assert_eq!(TypeKind::from_name("bigint"), TypeKind::BigInt);
        assert_eq!(TypeKind::from_name("varchar"), TypeKind::Varchar);
        assert_eq!(TypeKind::from_name("timeuuid"), TypeKind::TimeUuid);
        assert!(TypeKind::from_name("decimal").is_primitive());
    }

    #[test]
    fn test_composite_names() {
        assert_eq!(TypeKind::from_name("list"), TypeKind::List);
        assert_eq!(TypeKind::from_name("frozen"), TypeKind::Frozen);
        assert!(TypeKind::Map.is_collection());
        assert!(!TypeKind::Tuple.is_collection());
        assert!(!TypeKind::Tuple.is_primitive());
    }

    #[test]
    fn test_legacy_marshal_names() {
        assert_eq!(
            TypeKind::from_name("'org.apache.cassandra.db.marshal.ReversedType'"),
            TypeKind::Reversed
        );
        assert_eq!(
            TypeKind::from_name("org.apache.cassandra.db.marshal.UserType"),
            TypeKind::UserType
        );
        assert_eq!(
            TypeKind::from_name(TypeKind::Composite.name()),
            TypeKind::Composite
        );
    }

    #[test]
    fn test_exact_match_only() {
        assert_eq!(TypeKind::from_name("INT"), TypeKind::Unknown);
        assert_eq!(TypeKind::from_name(" int"), TypeKind::Unknown);
        assert_eq!(TypeKind::from_name("smallint"), TypeKind::Unknown);
        assert_eq!(TypeKind::from_name(""), TypeKind::Unknown);
    }

    #[test]
    fn test_known_names_round_trip() {
        let names = known_type_names();
        assert_eq!(names.len(), SHORT_NAMES.len() + 2 * MARSHAL_CLASSES.len());
        for name in names {
            assert_ne!(TypeKind::from_name(name), TypeKind::Unknown, "{}", name);
        }
    }
}
