//! Type descriptors
//!
//! A [`TypeDescriptor`] is the caller's description of a column or value
//! type: a type name, ordered child descriptors, and for user types a
//! [`UserTypeSpec`] carrying field names and constructors. Descriptors are
//! only consumed here; the [`TypeFactory`](crate::factory::TypeFactory)
//! turns them into decoder trees.
//!
//! Descriptors can also be written as type expressions:
//!
//! ```text
//! list<int>
//! map<text, frozen<tuple<int, uuid>>>
//! 'org.apache.cassandra.db.marshal.ReversedType'<timestamp>
//! ks.address{street text, zip: int}
//! ```

use crate::constructors::{udt_mapped, MappedConstructor, TupleConstructor};
use crate::error::{Error, Result};
use crate::type_names::TypeKind;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, tuple},
    IResult,
};
use std::fmt;
use std::str::FromStr;

/// Deepest `<`/`{` nesting accepted in a type expression
pub const MAX_EXPRESSION_DEPTH: usize = 128;

/// Description of a CQL type, consumed by the type factory
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    subtypes: Vec<TypeDescriptor>,
    user_type: Option<UserTypeSpec>,
}

impl TypeDescriptor {
    /// Descriptor without children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtypes: Vec::new(),
            user_type: None,
        }
    }

    /// Descriptor with ordered children
    pub fn with_subtypes(name: impl Into<String>, subtypes: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            subtypes,
            user_type: None,
        }
    }

    pub fn list(item: TypeDescriptor) -> Self {
        Self::with_subtypes("list", vec![item])
    }

    pub fn set(item: TypeDescriptor) -> Self {
        Self::with_subtypes("set", vec![item])
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::with_subtypes("map", vec![key, value])
    }

    pub fn tuple(items: Vec<TypeDescriptor>) -> Self {
        Self::with_subtypes("tuple", items)
    }

    pub fn frozen(inner: TypeDescriptor) -> Self {
        Self::with_subtypes("frozen", vec![inner])
    }

    pub fn reversed(inner: TypeDescriptor) -> Self {
        Self::with_subtypes(TypeKind::Reversed.name(), vec![inner])
    }

    /// User type whose values are built as [`Value::Udt`](crate::Value::Udt)
    pub fn user_type(
        type_name: impl Into<String>,
        fields: Vec<(String, TypeDescriptor)>,
    ) -> Self {
        let type_name = type_name.into();
        let (field_names, subtypes): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
        let spec = UserTypeSpec::new(field_names)
            .with_type_name(type_name.clone())
            .with_mapped(udt_mapped(Some(type_name)));

        Self::with_subtypes(TypeKind::UserType.name(), subtypes).with_user_type(spec)
    }

    /// Attach user type metadata, flagging this descriptor as a user type
    pub fn with_user_type(mut self, spec: UserTypeSpec) -> Self {
        self.user_type = Some(spec);
        self
    }

    /// Parse a type expression
    pub fn parse(expression: &str) -> Result<Self> {
        parse_type_expr(expression)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subtypes(&self) -> &[TypeDescriptor] {
        &self.subtypes
    }

    pub fn user_type_spec(&self) -> Option<&UserTypeSpec> {
        self.user_type.as_ref()
    }

    /// Resolved kind of this descriptor's name
    pub fn kind(&self) -> TypeKind {
        TypeKind::from_name(&self.name)
    }

    /// Whether the factory treats this descriptor as a user type
    pub fn is_user_type(&self) -> bool {
        self.user_type.is_some() || self.kind() == TypeKind::UserType
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("subtypes", &self.subtypes)
            .field("user_type", &self.user_type)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(spec) = &self.user_type {
            write!(f, "{}{{", spec.type_name().unwrap_or(&self.name))?;
            for (i, (field, subtype)) in spec.field_names().iter().zip(&self.subtypes).enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", field, subtype)?;
            }
            return write!(f, "}}");
        }

        write!(f, "{}", self.name)?;
        if !self.subtypes.is_empty() {
            write!(f, "<")?;
            for (i, subtype) in self.subtypes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", subtype)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_type_expr(s)
    }
}

/// User type capability carried by a descriptor
#[derive(Clone)]
pub struct UserTypeSpec {
    type_name: Option<String>,
    field_names: Vec<String>,
    mapped: Option<MappedConstructor>,
    positional: Option<TupleConstructor>,
}

impl UserTypeSpec {
    /// Field layout with no constructors yet
    pub fn new(field_names: Vec<String>) -> Self {
        Self {
            type_name: None,
            field_names,
            mapped: None,
            positional: None,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Build values from a name → value mapping
    pub fn with_mapped(mut self, constructor: MappedConstructor) -> Self {
        self.mapped = Some(constructor);
        self
    }

    /// Build values positionally; used only when no mapped constructor is set
    pub fn with_positional(mut self, constructor: TupleConstructor) -> Self {
        self.positional = Some(constructor);
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn mapped(&self) -> Option<&MappedConstructor> {
        self.mapped.as_ref()
    }

    pub fn positional(&self) -> Option<&TupleConstructor> {
        self.positional.as_ref()
    }
}

impl fmt::Debug for UserTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserTypeSpec")
            .field("type_name", &self.type_name)
            .field("field_names", &self.field_names)
            .field("mapped", &self.mapped.is_some())
            .field("positional", &self.positional.is_some())
            .finish()
    }
}

/// Wrap a parser so it skips surrounding whitespace
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Unquoted name: letters, digits, `_` and `.`
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.')(input)
}

/// Single-quoted marshal class name, quotes included
fn quoted_name(input: &str) -> IResult<&str, &str> {
    recognize(delimited(char('\''), take_while(|c| c != '\''), char('\'')))(input)
}

fn type_name(input: &str) -> IResult<&str, &str> {
    alt((quoted_name, identifier))(input)
}

/// `name [:] type` inside a user type body
fn field(input: &str) -> IResult<&str, (String, TypeDescriptor)> {
    map(
        tuple((ws(identifier), opt(ws(char(':'))), type_expr)),
        |(name, _, subtype)| (name.to_string(), subtype),
    )(input)
}

fn type_expr(input: &str) -> IResult<&str, TypeDescriptor> {
    let (input, name) = ws(type_name)(input)?;

    let mut user_body = delimited(
        char('{'),
        separated_list1(char(','), field),
        ws(char('}')),
    );
    if let Ok((rest, fields)) = user_body(input) {
        return Ok((rest, TypeDescriptor::user_type(name, fields)));
    }

    let (input, subtypes) = opt(delimited(
        char('<'),
        separated_list1(char(','), type_expr),
        ws(char('>')),
    ))(input)?;

    Ok((
        input,
        TypeDescriptor::with_subtypes(name, subtypes.unwrap_or_default()),
    ))
}

fn nesting_depth(expression: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    for c in expression.chars() {
        match c {
            '<' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            '>' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Parse a type expression into a descriptor
///
/// # Errors
///
/// Returns [`Error::TypeSyntax`] if the expression is malformed or nested
/// deeper than [`MAX_EXPRESSION_DEPTH`].
pub fn parse_type_expr(expression: &str) -> Result<TypeDescriptor> {
    if nesting_depth(expression) > MAX_EXPRESSION_DEPTH {
        return Err(Error::type_syntax(format!(
            "type expression nested deeper than {} levels",
            MAX_EXPRESSION_DEPTH
        )));
    }

    match all_consuming(type_expr)(expression) {
        Ok((_, descriptor)) => Ok(descriptor),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(Error::type_syntax(format!(
            "invalid type expression '{}' near '{}'",
            expression, e.input
        ))),
        Err(nom::Err::Incomplete(_)) => Err(Error::type_syntax(format!(
            "incomplete type expression '{}'",
            expression
        ))),
    }
}
