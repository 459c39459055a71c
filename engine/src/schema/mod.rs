//! Record schemas: the shape a load populates.
//!
//! A [`Schema`] is an ordered list of fields, each with a name, a
//! [`FieldType`], an optional tag and a typed setter. It replaces runtime
//! introspection of the record type:
//!
//! - [`Record`] - implemented by typed records, supplies their schema
//! - [`SchemaBuilder`] - builds a schema from typed setters
//! - [`SchemaDescriptor`] - JSON description producing [`JsonRecord`]s
//! - [`Value`] - a coerced cell on its way into a setter

use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;
use std::path::Path;

use crate::error::{ConfigResult, ConvertError, ConvertResult};

// =============================================================================
// Field Types
// =============================================================================

/// Semantic type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    /// A type the engine has no coercion for, kept by name.
    Unsupported(String),
}

impl FieldType {
    /// Parse a type name. Unknown names become [`FieldType::Unsupported`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "string" | "str" | "text" => Self::String,
            "bool" | "boolean" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" | "int" => Self::I32,
            "i64" => Self::I64,
            "isize" => Self::Isize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" | "uint" => Self::U32,
            "u64" => Self::U64,
            "usize" => Self::Usize,
            "f32" => Self::F32,
            "f64" | "float" | "double" => Self::F64,
            _ => Self::Unsupported(name.to_string()),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Unsupported(name) => name,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Zero value used for fields no directive populates.
    pub fn zero_json(&self) -> serde_json::Value {
        match self {
            Self::String => serde_json::Value::String(String::new()),
            Self::Bool => serde_json::Value::Bool(false),
            Self::F32 | Self::F64 => serde_json::json!(0.0),
            Self::Unsupported(_) => serde_json::Value::Null,
            _ => serde_json::json!(0),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.name().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Values
// =============================================================================

/// A coerced cell. Integers are widened to 64 bits after a width-checked parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
        }
    }

    /// JSON form. NaN has no JSON number and becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::UInt(u) => serde_json::Value::from(*u),
            Value::F32(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }

    fn mismatch(self, expected: &str) -> ConvertError {
        ConvertError::TypeMismatch {
            expected: expected.to_string(),
            found: self.kind().to_string(),
        }
    }
}

/// Rust types a typed setter can receive.
pub trait FromValue: Sized {
    const FIELD_TYPE: FieldType;

    fn from_value(value: Value) -> ConvertResult<Self>;
}

impl FromValue for String {
    const FIELD_TYPE: FieldType = FieldType::String;

    fn from_value(value: Value) -> ConvertResult<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}

impl FromValue for bool {
    const FIELD_TYPE: FieldType = FieldType::Bool;

    fn from_value(value: Value) -> ConvertResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other.mismatch("bool")),
        }
    }
}

macro_rules! signed_from_value {
    ($($t:ty => $ft:ident),* $(,)?) => {$(
        impl FromValue for $t {
            const FIELD_TYPE: FieldType = FieldType::$ft;

            fn from_value(value: Value) -> ConvertResult<Self> {
                match value {
                    Value::Int(i) => <$t>::try_from(i).map_err(|_| Value::Int(i).mismatch(stringify!($t))),
                    other => Err(other.mismatch(stringify!($t))),
                }
            }
        }
    )*};
}

macro_rules! unsigned_from_value {
    ($($t:ty => $ft:ident),* $(,)?) => {$(
        impl FromValue for $t {
            const FIELD_TYPE: FieldType = FieldType::$ft;

            fn from_value(value: Value) -> ConvertResult<Self> {
                match value {
                    Value::UInt(u) => <$t>::try_from(u).map_err(|_| Value::UInt(u).mismatch(stringify!($t))),
                    other => Err(other.mismatch(stringify!($t))),
                }
            }
        }
    )*};
}

signed_from_value!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize);
unsigned_from_value!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize);

impl FromValue for f32 {
    const FIELD_TYPE: FieldType = FieldType::F32;

    fn from_value(value: Value) -> ConvertResult<Self> {
        match value {
            Value::F32(f) => Ok(f),
            other => Err(other.mismatch("f32")),
        }
    }
}

impl FromValue for f64 {
    const FIELD_TYPE: FieldType = FieldType::F64;

    fn from_value(value: Value) -> ConvertResult<Self> {
        match value {
            Value::F64(f) => Ok(f),
            Value::F32(f) => Ok(f64::from(f)),
            other => Err(other.mismatch("f64")),
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

type Setter<R> = Box<dyn Fn(&mut R, Value) -> ConvertResult<()> + Send + Sync>;
type Factory<R> = Box<dyn Fn() -> R + Send + Sync>;

/// One field of a record schema.
pub struct FieldDef<R> {
    pub name: String,
    pub field_type: FieldType,
    /// Raw tag, `None` when the field is untagged.
    pub tag: Option<String>,
    setter: Setter<R>,
}

impl<R> FieldDef<R> {
    /// Store a coerced value into the record.
    pub fn set(&self, record: &mut R, value: Value) -> ConvertResult<()> {
        (self.setter)(record, value)
    }
}

impl<R> fmt::Debug for FieldDef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Ordered field list for a record type `R`, plus how to make a zero-valued `R`.
pub struct Schema<R> {
    name: String,
    fields: Vec<FieldDef<R>>,
    factory: Factory<R>,
}

impl<R> Schema<R> {
    /// Identity used to key the directive cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef<R>] {
        &self.fields
    }

    /// A fresh zero-valued record.
    pub fn new_record(&self) -> R {
        (self.factory)()
    }
}

impl<R: Default + 'static> Schema<R> {
    /// Start a schema named after the Rust type.
    pub fn builder() -> SchemaBuilder<R> {
        SchemaBuilder::with_factory(type_name::<R>(), R::default)
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<R> {
    name: String,
    fields: Vec<FieldDef<R>>,
    factory: Factory<R>,
}

impl<R> SchemaBuilder<R> {
    /// Start a schema whose zero records come from `factory`.
    pub fn with_factory(name: &str, factory: impl Fn() -> R + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Override the schema name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Add a typed field. An empty `tag` means the field is untagged.
    pub fn field<T: FromValue + 'static>(
        self,
        name: &str,
        tag: &str,
        setter: impl Fn(&mut R, T) + Send + Sync + 'static,
    ) -> Self {
        self.field_with_type(name, T::FIELD_TYPE, tag, move |record, value| {
            setter(record, T::from_value(value)?);
            Ok(())
        })
    }

    /// Add a field with an explicit type and an untyped setter.
    pub fn field_with_type(
        mut self,
        name: &str,
        field_type: FieldType,
        tag: &str,
        setter: impl Fn(&mut R, Value) -> ConvertResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            field_type,
            tag: (!tag.is_empty()).then(|| tag.to_string()),
            setter: Box::new(setter),
        });
        self
    }

    pub fn build(self) -> Schema<R> {
        Schema {
            name: self.name,
            fields: self.fields,
            factory: self.factory,
        }
    }
}

/// A record type with a static schema.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Apple { name: String, diameter: f64 }
///
/// impl Record for Apple {
///     fn schema() -> Schema<Self> {
///         Schema::builder()
///             .field("Name", "col:Name", |a: &mut Apple, v: String| a.name = v)
///             .field("Diameter", "col:Diameter", |a: &mut Apple, v: f64| a.diameter = v)
///             .build()
///     }
/// }
/// ```
pub trait Record: Sized + 'static {
    fn schema() -> Schema<Self>;
}

// =============================================================================
// Dynamic (JSON) Records
// =============================================================================

/// A record whose shape is only known at runtime.
pub type JsonRecord = serde_json::Map<String, serde_json::Value>;

/// JSON description of a record shape.
///
/// ```json
/// {
///   "name": "Apple",
///   "fields": [
///     { "name": "Name", "type": "string", "tag": "col:Name" },
///     { "name": "Year", "type": "u32", "tag": "intcols:colname" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default = "default_descriptor_name")]
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

fn default_descriptor_name() -> String {
    "record".to_string()
}

/// One field of a [`SchemaDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub tag: Option<String>,
}

impl SchemaDescriptor {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Build a schema producing JSON objects with every field present.
    pub fn to_schema(&self) -> Schema<JsonRecord> {
        let zero: JsonRecord = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.field_type.zero_json()))
            .collect();

        let mut builder = SchemaBuilder::with_factory(&self.name, move || zero.clone());
        for field in &self.fields {
            let key = field.name.clone();
            builder = builder.field_with_type(
                &field.name,
                field.field_type.clone(),
                field.tag.as_deref().unwrap_or(""),
                move |record: &mut JsonRecord, value| {
                    record.insert(key.clone(), value.to_json());
                    Ok(())
                },
            );
        }
        builder.build()
    }
}
