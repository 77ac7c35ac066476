//! Type factory
//!
//! Turns [`TypeDescriptor`]s into owned [`Decoder`] trees. The factory holds
//! the value constructors every tree needs and nothing else, so one factory
//! can serve any number of threads.
//!
//! Resolution is transactional: children are resolved into a temporary
//! vector and the parent is only assembled once all of them succeeded. On
//! failure everything built so far is dropped and no partial tree escapes.

use crate::buffer::Buffer;
use crate::config::DecodeConfig;
use crate::constructors::ValueConstructors;
use crate::decoder::{Decoder, UserTypeConstructor, UserTypeDecoder};
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::row_reader::{ResultRowReader, Row};
use crate::type_names::TypeKind;
use crate::types::{UuidKind, Value};
use log::debug;

/// Builds decoder trees from type descriptors
#[derive(Debug, Clone)]
pub struct TypeFactory {
    constructors: ValueConstructors,
    max_nesting_depth: usize,
}

impl TypeFactory {
    /// Factory over a complete constructor set with default limits
    pub fn new(constructors: ValueConstructors) -> Self {
        Self {
            constructors,
            max_nesting_depth: DecodeConfig::default().max_nesting_depth,
        }
    }

    /// Factory over the native constructors
    pub fn native() -> Self {
        Self::new(ValueConstructors::native())
    }

    /// Factory with limits taken from a validated configuration
    pub fn from_config(constructors: ValueConstructors, config: &DecodeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            constructors,
            max_nesting_depth: config.max_nesting_depth,
        })
    }

    pub fn constructors(&self) -> &ValueConstructors {
        &self.constructors
    }

    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    /// Build the decoder tree for one descriptor
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedType`] for names that resolve to no decoder
    /// * [`Error::InvalidLength`] when a descriptor has the wrong number of
    ///   children, or a user type's field names and children disagree
    /// * [`Error::InvalidDescriptor`] for a user type without constructors
    /// * [`Error::NestingTooDeep`] past the configured nesting limit
    pub fn from_descriptor(&self, descriptor: &TypeDescriptor) -> Result<Decoder> {
        let decoder = self.resolve(descriptor, 1)?;
        debug!(
            "Resolved {} into {} decoder(s)",
            descriptor,
            decoder.node_count()
        );
        Ok(decoder)
    }

    /// Build one decoder tree per descriptor, failing on the first error
    pub fn vectorize_many(&self, descriptors: &[TypeDescriptor]) -> Result<Vec<Decoder>> {
        descriptors
            .iter()
            .map(|descriptor| self.from_descriptor(descriptor))
            .collect()
    }

    /// Decode a single value encoded with `descriptor`'s type
    pub fn deserialize_one(
        &self,
        raw: &[u8],
        descriptor: &TypeDescriptor,
        protocol_version: u8,
    ) -> Result<Value> {
        let decoder = self.from_descriptor(descriptor)?;
        decoder.decode(&mut Buffer::new(raw), protocol_version)
    }

    /// Decode `row_count` rows whose columns have the given types
    pub fn deserialize_rows(
        &self,
        raw: &[u8],
        row_count: usize,
        columns: &[TypeDescriptor],
        protocol_version: u8,
    ) -> Result<Vec<Row>> {
        let reader = ResultRowReader::new(self.vectorize_many(columns)?);
        reader.read_all(&mut Buffer::new(raw), row_count, protocol_version)
    }

    fn resolve(&self, descriptor: &TypeDescriptor, depth: usize) -> Result<Decoder> {
        if depth > self.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                limit: self.max_nesting_depth,
            });
        }

        if descriptor.is_user_type() {
            return self.resolve_user_type(descriptor, depth);
        }

        let constructors = &self.constructors;
        let decoder = match descriptor.kind() {
            TypeKind::Ascii | TypeKind::Blob => Decoder::Bytes,
            TypeKind::Boolean => Decoder::Boolean,
            TypeKind::Counter | TypeKind::BigInt => Decoder::Int64,
            TypeKind::Decimal => Decoder::Decimal(constructors.decimal.clone()),
            TypeKind::Double => Decoder::Float64,
            TypeKind::Float => Decoder::Float32,
            TypeKind::Inet => Decoder::Inet,
            TypeKind::Int => Decoder::Int32,
            TypeKind::Varint => Decoder::Varint,
            TypeKind::Text | TypeKind::Varchar => Decoder::Text,
            TypeKind::Timestamp => Decoder::Timestamp(constructors.datetime.clone()),
            TypeKind::Uuid => Decoder::Uuid {
                kind: UuidKind::Random,
                constructor: constructors.uuid.clone(),
            },
            TypeKind::TimeUuid => Decoder::Uuid {
                kind: UuidKind::TimeBased,
                constructor: constructors.uuid.clone(),
            },
            TypeKind::List => Decoder::List(Box::new(self.resolve_single(descriptor, depth)?)),
            TypeKind::Set => Decoder::Set {
                item: Box::new(self.resolve_single(descriptor, depth)?),
                constructor: constructors.sorted_set.clone(),
            },
            TypeKind::Frozen => Decoder::Frozen(Box::new(self.resolve_single(descriptor, depth)?)),
            TypeKind::Reversed => {
                Decoder::Reversed(Box::new(self.resolve_single(descriptor, depth)?))
            }
            TypeKind::Map => {
                expect_arity(descriptor, 2)?;
                let mut children = self.resolve_children(descriptor.subtypes(), depth)?;
                let value = children.pop();
                let key = children.pop();
                match (key, value) {
                    (Some(key), Some(value)) => Decoder::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                        constructor: constructors.ordered_map.clone(),
                    },
                    _ => return Err(arity_error(descriptor, 2)),
                }
            }
            TypeKind::Tuple => Decoder::Tuple(self.resolve_children(descriptor.subtypes(), depth)?),
            TypeKind::Unknown
            | TypeKind::Composite
            | TypeKind::DynamicComposite
            | TypeKind::ColumnToCollection
            | TypeKind::UserType => {
                return Err(Error::unsupported_type(descriptor.name()));
            }
        };

        Ok(decoder)
    }

    fn resolve_single(&self, descriptor: &TypeDescriptor, depth: usize) -> Result<Decoder> {
        expect_arity(descriptor, 1)?;
        match descriptor.subtypes() {
            [child] => self.resolve(child, depth + 1),
            _ => Err(arity_error(descriptor, 1)),
        }
    }

    fn resolve_children(&self, children: &[TypeDescriptor], depth: usize) -> Result<Vec<Decoder>> {
        children
            .iter()
            .map(|child| self.resolve(child, depth + 1))
            .collect()
    }

    fn resolve_user_type(&self, descriptor: &TypeDescriptor, depth: usize) -> Result<Decoder> {
        let spec = descriptor.user_type_spec().ok_or_else(|| {
            Error::invalid_descriptor(format!(
                "user type {} carries no field names or constructors",
                descriptor.name()
            ))
        })?;

        let field_names = spec.field_names();
        if field_names.len() != descriptor.subtypes().len() {
            return Err(Error::invalid_length(format!(
                "user type {} has {} field names but {} field types",
                descriptor,
                field_names.len(),
                descriptor.subtypes().len()
            )));
        }

        let constructor = match (spec.mapped(), spec.positional()) {
            (Some(mapped), _) => UserTypeConstructor::Mapped(mapped.clone()),
            (None, Some(positional)) => UserTypeConstructor::Positional(positional.clone()),
            (None, None) => {
                return Err(Error::invalid_descriptor(format!(
                    "user type {} has neither a mapped nor a positional constructor",
                    descriptor
                )));
            }
        };

        let decoders = self.resolve_children(descriptor.subtypes(), depth)?;
        let fields = field_names.iter().cloned().zip(decoders).collect();

        Ok(Decoder::UserType(UserTypeDecoder::new(
            spec.type_name().map(str::to_string),
            fields,
            constructor,
        )))
    }
}

impl Default for TypeFactory {
    fn default() -> Self {
        Self::native()
    }
}

fn expect_arity(descriptor: &TypeDescriptor, expected: usize) -> Result<()> {
    if descriptor.subtypes().len() == expected {
        Ok(())
    } else {
        Err(arity_error(descriptor, expected))
    }
}

fn arity_error(descriptor: &TypeDescriptor, expected: usize) -> Error {
    Error::invalid_length(format!(
        "{} takes {} type argument(s), got {}",
        descriptor.name(),
        expected,
        descriptor.subtypes().len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::{udt_mapped, udt_positional};
    use crate::descriptor::UserTypeSpec;
    use std::sync::Arc;

    fn parse(expression: &str) -> TypeDescriptor {
        TypeDescriptor::parse(expression).unwrap()
    }

    #[test]
    fn test_factory_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeFactory>();
    }

    #[test]
    fn test_primitive_resolution() {
        let factory = TypeFactory::native();
        let cases = [
            ("ascii", TypeKind::Blob),
            ("blob", TypeKind::Blob),
            ("counter", TypeKind::BigInt),
            ("bigint", TypeKind::BigInt),
            ("varchar", TypeKind::Text),
            ("timeuuid", TypeKind::TimeUuid),
            ("uuid", TypeKind::Uuid),
            ("timestamp", TypeKind::Timestamp),
            ("decimal", TypeKind::Decimal),
        ];

        for (name, kind) in cases {
            let decoder = factory.from_descriptor(&TypeDescriptor::new(name)).unwrap();
            assert_eq!(decoder.kind(), kind, "{}", name);
        }
    }

    #[test]
    fn test_composite_resolution() {
        let factory = TypeFactory::native();
        let decoder = factory
            .from_descriptor(&parse("map<text, frozen<list<tuple<int, uuid>>>>"))
            .unwrap();
        assert_eq!(decoder.kind(), TypeKind::Map);
        assert_eq!(decoder.node_count(), 7);

        let reversed = factory
            .from_descriptor(&parse("'org.apache.cassandra.db.marshal.ReversedType'<int>"))
            .unwrap();
        assert_eq!(reversed.kind(), TypeKind::Reversed);
    }

    #[test]
    fn test_unsupported_types() {
        let factory = TypeFactory::native();
        for name in [
            "smallint",
            "INT",
            "'org.apache.cassandra.db.marshal.CompositeType'",
            "org.apache.cassandra.db.marshal.DynamicCompositeType",
        ] {
            let err = factory.from_descriptor(&TypeDescriptor::new(name)).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedType(ref n) if n == name),
                "{}: {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_child_count_checked() {
        let factory = TypeFactory::native();
        let cases = [
            TypeDescriptor::new("list"),
            TypeDescriptor::with_subtypes(
                "set",
                vec![TypeDescriptor::new("int"), TypeDescriptor::new("int")],
            ),
            TypeDescriptor::with_subtypes("map", vec![TypeDescriptor::new("int")]),
            TypeDescriptor::new("frozen"),
            TypeDescriptor::new(TypeKind::Reversed.name()),
            TypeDescriptor::with_subtypes(
                TypeKind::Reversed.name(),
                vec![TypeDescriptor::new("int"), TypeDescriptor::new("int")],
            ),
            TypeDescriptor::tuple(vec![
                TypeDescriptor::new("int"),
                TypeDescriptor::with_subtypes(
                    TypeKind::Reversed.name(),
                    vec![TypeDescriptor::new("decimal"), TypeDescriptor::new("int")],
                ),
            ]),
        ];

        let baseline = Arc::strong_count(&factory.constructors().decimal);
        for descriptor in &cases {
            let err = factory.from_descriptor(descriptor).unwrap_err();
            assert!(matches!(err, Error::InvalidLength(_)), "{:?}", err);
        }
        assert_eq!(Arc::strong_count(&factory.constructors().decimal), baseline);
    }

    #[test]
    fn test_nested_failure_reports_innermost_name() {
        let factory = TypeFactory::native();
        let err = factory
            .from_descriptor(&parse("map<int, list<tuple<int, bogus>>>"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref n) if n == "bogus"));
    }

    #[test]
    fn test_user_type_resolution() {
        let factory = TypeFactory::native();
        let descriptor = TypeDescriptor::user_type(
            "address",
            vec![
                ("street".to_string(), TypeDescriptor::new("text")),
                ("zip".to_string(), TypeDescriptor::new("int")),
            ],
        );

        let decoder = factory.from_descriptor(&descriptor).unwrap();
        match &decoder {
            Decoder::UserType(user_type) => {
                assert_eq!(user_type.type_name(), Some("address"));
                assert_eq!(user_type.field_names().collect::<Vec<_>>(), ["street", "zip"]);
            }
            other => panic!("expected user type decoder, got {:?}", other),
        }
    }

    #[test]
    fn test_user_type_detected_by_capability() {
        let factory = TypeFactory::native();
        let descriptor = TypeDescriptor::with_subtypes("address", vec![TypeDescriptor::new("int")])
            .with_user_type(UserTypeSpec::new(vec!["zip".into()]).with_positional(udt_positional()));

        let value = factory
            .deserialize_one(&hex::decode("0000000400000007").unwrap(), &descriptor, 3)
            .unwrap();
        assert_eq!(value, Value::Tuple(vec![Value::Int32(7)]));
    }

    #[test]
    fn test_user_type_without_constructor() {
        let factory = TypeFactory::native();
        let descriptor = TypeDescriptor::with_subtypes("address", vec![TypeDescriptor::new("int")])
            .with_user_type(UserTypeSpec::new(vec!["zip".into()]));
        assert!(matches!(
            factory.from_descriptor(&descriptor),
            Err(Error::InvalidDescriptor(_))
        ));

        let bare = TypeDescriptor::new(TypeKind::UserType.name());
        assert!(matches!(
            factory.from_descriptor(&bare),
            Err(Error::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_user_type_count_mismatch_builds_nothing() {
        let factory = TypeFactory::native();
        let decimals = Arc::strong_count(&factory.constructors().decimal);
        let datetimes = Arc::strong_count(&factory.constructors().datetime);

        let too_few_names = TypeDescriptor::with_subtypes(
            "ledger",
            vec![TypeDescriptor::new("decimal"), TypeDescriptor::new("decimal")],
        )
        .with_user_type(UserTypeSpec::new(vec!["amount".into()]).with_mapped(udt_mapped(None)));

        let too_many_names = TypeDescriptor::with_subtypes(
            "ledger",
            vec![TypeDescriptor::new("timestamp")],
        )
        .with_user_type(
            UserTypeSpec::new(vec!["at".into(), "amount".into()]).with_positional(udt_positional()),
        );

        // mismatch nested below a sibling that resolves fine
        let nested = TypeDescriptor::tuple(vec![
            TypeDescriptor::new("decimal"),
            TypeDescriptor::new("timestamp"),
            too_few_names.clone(),
        ]);

        for descriptor in [&too_few_names, &too_many_names, &nested] {
            let err = factory.from_descriptor(descriptor).unwrap_err();
            assert!(matches!(err, Error::InvalidLength(_)), "{:?}", err);
            assert_eq!(Arc::strong_count(&factory.constructors().decimal), decimals);
            assert_eq!(Arc::strong_count(&factory.constructors().datetime), datetimes);
        }
    }

    #[test]
    fn test_failed_resolution_drops_built_siblings() {
        let factory = TypeFactory::native();
        let baseline = Arc::strong_count(&factory.constructors().decimal);

        let err = factory
            .from_descriptor(&parse("tuple<decimal, decimal, nope>"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
        assert_eq!(Arc::strong_count(&factory.constructors().decimal), baseline);

        let err = factory
            .vectorize_many(&[parse("decimal"), parse("set<decimal>"), parse("nope")])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
        assert_eq!(Arc::strong_count(&factory.constructors().decimal), baseline);
    }

    #[test]
    fn test_successful_tree_holds_constructors_until_dropped() {
        let factory = TypeFactory::native();
        let baseline = Arc::strong_count(&factory.constructors().decimal);

        let decoder = factory.from_descriptor(&parse("list<decimal>")).unwrap();
        assert_eq!(Arc::strong_count(&factory.constructors().decimal), baseline + 1);

        drop(decoder);
        assert_eq!(Arc::strong_count(&factory.constructors().decimal), baseline);
    }

    #[test]
    fn test_nesting_limit() {
        let config = DecodeConfig {
            max_nesting_depth: 3,
            ..DecodeConfig::default()
        };
        let factory = TypeFactory::from_config(ValueConstructors::native(), &config).unwrap();

        assert!(factory.from_descriptor(&parse("list<list<int>>")).is_ok());
        assert!(matches!(
            factory.from_descriptor(&parse("list<list<list<int>>>")),
            Err(Error::NestingTooDeep { limit: 3 })
        ));
    }

    #[test]
    fn test_from_config_validates() {
        let config = DecodeConfig {
            max_nesting_depth: 0,
            ..DecodeConfig::default()
        };
        assert!(matches!(
            TypeFactory::from_config(ValueConstructors::native(), &config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_deserialize_rows() {
        let factory = TypeFactory::native();
        let raw = hex::decode("00000004000000010000000141ffffffff00000000").unwrap();
        let rows = factory
            .deserialize_rows(&raw, 2, &[parse("int"), parse("text")], 3)
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int32(1), Value::Text("A".into())],
                vec![Value::Null, Value::Text(String::new())],
            ]
        );
    }
}
