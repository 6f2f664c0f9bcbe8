//! ORC type descriptions.
//!
//! The textual form follows ORC's own notation, for example
//! `struct<id:bigint,price:decimal(10,2),tags:array<string>>`. Column vectors
//! are Arrow arrays, so every description also converts to and from an Arrow
//! schema. Char and varchar lengths survive the Arrow round trip through the
//! `orc.type` field metadata key.

use crate::{FormatError, Result};
use arrow_schema::{DataType, Field, Fields, Schema, TimeUnit, UnionFields, UnionMode};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Field metadata key carrying the ORC type of string columns
pub const ORC_TYPE_KEY: &str = "orc.type";

pub const DEFAULT_DECIMAL_PRECISION: u32 = 20;
pub const DEFAULT_DECIMAL_SCALE: i32 = 10;
pub const MAX_DECIMAL_PRECISION: u32 = 38;
pub const DEFAULT_CHAR_LENGTH: u32 = 255;
pub const DEFAULT_VARCHAR_LENGTH: u32 = 65535;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrcType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: u32, scale: i32 },
    Char(u32),
    VarChar(u32),
    String,
    Binary,
    Date,
    Timestamp,
    Struct(Vec<(String, OrcType)>),
    List(Box<OrcType>),
    Map(Box<OrcType>, Box<OrcType>),
    Union(Vec<OrcType>),
}

impl OrcType {
    /// Physical name as listed in the ORC catalog
    pub fn kind_name(&self) -> &'static str {
        match self {
            OrcType::Boolean => "boolean",
            OrcType::TinyInt => "tinyint",
            OrcType::SmallInt => "smallint",
            OrcType::Int => "int",
            OrcType::BigInt => "bigint",
            OrcType::Float => "float",
            OrcType::Double => "double",
            OrcType::Decimal { .. } => "decimal",
            OrcType::Char(_) => "char",
            OrcType::VarChar(_) => "varchar",
            OrcType::String => "string",
            OrcType::Binary => "binary",
            OrcType::Date => "date",
            OrcType::Timestamp => "timestamp",
            OrcType::Struct(_) => "struct",
            OrcType::List(_) => "array",
            OrcType::Map(_, _) => "map",
            OrcType::Union(_) => "uniontype",
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            OrcType::Struct(_) | OrcType::List(_) | OrcType::Map(_, _) | OrcType::Union(_)
        )
    }

    /// Children of a struct type
    pub fn fields(&self) -> Option<&[(String, OrcType)]> {
        match self {
            OrcType::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Checked ORC decimal type
    pub fn decimal(precision: u32, scale: i32) -> Result<OrcType> {
        check_decimal(precision, scale)?;
        Ok(OrcType::Decimal { precision, scale })
    }

    pub fn to_arrow(&self) -> Result<DataType> {
        Ok(match self {
            OrcType::Boolean => DataType::Boolean,
            OrcType::TinyInt => DataType::Int8,
            OrcType::SmallInt => DataType::Int16,
            OrcType::Int => DataType::Int32,
            OrcType::BigInt => DataType::Int64,
            OrcType::Float => DataType::Float32,
            OrcType::Double => DataType::Float64,
            OrcType::Decimal { precision, scale } => {
                let (precision, scale) = check_decimal(*precision, *scale)?;
                DataType::Decimal128(precision, scale)
            }
            OrcType::Char(_) | OrcType::VarChar(_) | OrcType::String => DataType::Utf8,
            OrcType::Binary => DataType::Binary,
            OrcType::Date => DataType::Date32,
            OrcType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, None),
            OrcType::Struct(fields) => DataType::Struct(
                fields
                    .iter()
                    .map(|(name, ty)| ty.to_arrow_field(name))
                    .collect::<Result<Fields>>()?,
            ),
            OrcType::List(item) => DataType::List(Arc::new(item.to_arrow_field("item")?)),
            OrcType::Map(key, value) => {
                let entries = Fields::from(vec![
                    key.to_arrow_field("keys")?.with_nullable(false),
                    value.to_arrow_field("values")?,
                ]);
                DataType::Map(
                    Arc::new(Field::new("entries", DataType::Struct(entries), false)),
                    false,
                )
            }
            OrcType::Union(variants) => {
                let fields = variants
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| ty.to_arrow_field(&format!("_{}", i)))
                    .collect::<Result<Vec<_>>>()?;
                let type_ids = 0..i8::try_from(fields.len()).map_err(|_| {
                    FormatError::malformed_schema(format!("'{}' has too many variants", self))
                })?;
                DataType::Union(UnionFields::new(type_ids, fields), UnionMode::Sparse)
            }
        })
    }

    /// Nullable Arrow field; ORC has no per-column nullability
    pub fn to_arrow_field(&self, name: &str) -> Result<Field> {
        let field = Field::new(name, self.to_arrow()?, true);
        Ok(match self {
            OrcType::Char(_) | OrcType::VarChar(_) => field.with_metadata(HashMap::from([(
                ORC_TYPE_KEY.to_string(),
                self.to_string(),
            )])),
            _ => field,
        })
    }

    pub fn from_arrow_field(field: &Field) -> Result<OrcType> {
        if let Some(text) = field.metadata().get(ORC_TYPE_KEY) {
            return text.parse();
        }

        Ok(match field.data_type() {
            DataType::Boolean => OrcType::Boolean,
            DataType::Int8 => OrcType::TinyInt,
            DataType::Int16 => OrcType::SmallInt,
            DataType::Int32 => OrcType::Int,
            DataType::Int64 => OrcType::BigInt,
            DataType::Float32 => OrcType::Float,
            DataType::Float64 => OrcType::Double,
            DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale) => {
                OrcType::Decimal {
                    precision: *precision as u32,
                    scale: *scale as i32,
                }
            }
            DataType::Utf8 | DataType::LargeUtf8 => OrcType::String,
            DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => {
                OrcType::Binary
            }
            DataType::Date32 | DataType::Date64 => OrcType::Date,
            DataType::Timestamp(_, _) => OrcType::Timestamp,
            DataType::Struct(fields) => OrcType::Struct(
                fields
                    .iter()
                    .map(|f| Ok((f.name().clone(), OrcType::from_arrow_field(f)?)))
                    .collect::<Result<_>>()?,
            ),
            DataType::List(item) | DataType::LargeList(item) => {
                OrcType::List(Box::new(OrcType::from_arrow_field(item)?))
            }
            DataType::Map(entries, _) => match entries.data_type() {
                DataType::Struct(kv) if kv.len() == 2 => OrcType::Map(
                    Box::new(OrcType::from_arrow_field(&kv[0])?),
                    Box::new(OrcType::from_arrow_field(&kv[1])?),
                ),
                other => {
                    return Err(FormatError::unrecognized_native_type(
                        field.name(),
                        other.to_string(),
                    ))
                }
            },
            DataType::Union(fields, _) => OrcType::Union(
                fields
                    .iter()
                    .map(|(_, f)| OrcType::from_arrow_field(f))
                    .collect::<Result<_>>()?,
            ),
            other => {
                return Err(FormatError::unrecognized_native_type(
                    field.name(),
                    other.to_string(),
                ))
            }
        })
    }

    /// Arrow schema of a struct description
    pub fn to_arrow_schema(&self) -> Result<Schema> {
        let fields = self.fields().ok_or_else(|| {
            FormatError::malformed_schema(format!("'{}' is not a struct type", self))
        })?;
        Ok(Schema::new(
            fields
                .iter()
                .map(|(name, ty)| ty.to_arrow_field(name))
                .collect::<Result<Vec<_>>>()?,
        ))
    }

    pub fn from_arrow_schema(schema: &Schema) -> Result<OrcType> {
        Ok(OrcType::Struct(
            schema
                .fields()
                .iter()
                .map(|f| Ok((f.name().clone(), OrcType::from_arrow_field(f)?)))
                .collect::<Result<_>>()?,
        ))
    }
}

impl fmt::Display for OrcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrcType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            OrcType::Char(len) => write!(f, "char({})", len),
            OrcType::VarChar(len) => write!(f, "varchar({})", len),
            OrcType::Struct(fields) => {
                f.write_str("struct<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_name(f, name)?;
                    write!(f, ":{}", ty)?;
                }
                f.write_str(">")
            }
            OrcType::List(item) => write!(f, "array<{}>", item),
            OrcType::Map(key, value) => write!(f, "map<{},{}>", key, value),
            OrcType::Union(variants) => {
                f.write_str("uniontype<")?;
                for (i, ty) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", ty)?;
                }
                f.write_str(">")
            }
            primitive => f.write_str(primitive.kind_name()),
        }
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        f.write_str(name)
    } else {
        write!(f, "`{}`", name.replace('`', "``"))
    }
}

impl FromStr for OrcType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser { text: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

/// Arrow precision and scale for an ORC decimal: precision 1 to 38, scale 0
/// to precision
fn check_decimal(precision: u32, scale: i32) -> Result<(u8, i8)> {
    let in_range = (1..=MAX_DECIMAL_PRECISION).contains(&precision)
        && u32::try_from(scale).is_ok_and(|s| s <= precision);
    match (u8::try_from(precision), i8::try_from(scale)) {
        (Ok(p), Ok(s)) if in_range => Ok((p, s)),
        _ => Err(FormatError::malformed_schema(format!(
            "decimal({},{}) is not a valid ORC decimal",
            precision, scale
        ))),
    }
}

impl Parser<'_> {
    fn error(&self, what: &str) -> FormatError {
        FormatError::malformed_schema(format!(
            "{} at offset {} in ORC type '{}'",
            what, self.pos, self.text
        ))
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn accept(&mut self, c: char) -> bool {
        let found = self.peek() == Some(c);
        if found {
            self.pos += c.len_utf8();
        }
        found
    }

    fn identifier(&mut self) -> Result<String> {
        if self.peek() == Some('`') {
            self.pos += 1;
            let mut name = String::new();
            loop {
                let c = self.rest().chars().next().ok_or_else(|| self.error("unterminated name"))?;
                self.pos += c.len_utf8();
                if c == '`' {
                    if self.rest().starts_with('`') {
                        self.pos += 1;
                        name.push('`');
                    } else {
                        return Ok(name);
                    }
                } else {
                    name.push(c);
                }
            }
        }

        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        let name = self.rest()[..len].to_string();
        self.pos += len;
        Ok(name)
    }

    fn number(&mut self) -> Result<u32> {
        self.skip_whitespace();
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest().len());
        let value = self.rest()[..len]
            .parse()
            .map_err(|_| self.error("expected a number"))?;
        self.pos += len;
        Ok(value)
    }

    fn parse_type(&mut self) -> Result<OrcType> {
        let keyword = self.identifier()?.to_ascii_lowercase();
        Ok(match keyword.as_str() {
            "boolean" => OrcType::Boolean,
            "tinyint" => OrcType::TinyInt,
            "smallint" => OrcType::SmallInt,
            "int" => OrcType::Int,
            "bigint" => OrcType::BigInt,
            "float" => OrcType::Float,
            "double" => OrcType::Double,
            "string" => OrcType::String,
            "binary" => OrcType::Binary,
            "date" => OrcType::Date,
            "timestamp" => OrcType::Timestamp,
            "decimal" => {
                if self.accept('(') {
                    let precision = self.number()?;
                    let scale = if self.accept(',') { self.number()? } else { 0 };
                    self.expect(')')?;
                    let scale = i32::try_from(scale).map_err(|_| self.error("decimal scale out of range"))?;
                    OrcType::decimal(precision, scale).map_err(|_| self.error("invalid decimal"))?
                } else {
                    OrcType::Decimal {
                        precision: DEFAULT_DECIMAL_PRECISION,
                        scale: DEFAULT_DECIMAL_SCALE,
                    }
                }
            }
            "char" => OrcType::Char(self.length(DEFAULT_CHAR_LENGTH)?),
            "varchar" => OrcType::VarChar(self.length(DEFAULT_VARCHAR_LENGTH)?),
            "struct" => {
                self.expect('<')?;
                let mut fields = Vec::new();
                if !self.accept('>') {
                    loop {
                        let name = self.identifier()?;
                        self.expect(':')?;
                        fields.push((name, self.parse_type()?));
                        if self.accept('>') {
                            break;
                        }
                        self.expect(',')?;
                    }
                }
                OrcType::Struct(fields)
            }
            "array" => {
                self.expect('<')?;
                let item = self.parse_type()?;
                self.expect('>')?;
                OrcType::List(Box::new(item))
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                OrcType::Map(Box::new(key), Box::new(value))
            }
            "uniontype" => {
                self.expect('<')?;
                let mut variants = vec![self.parse_type()?];
                while self.accept(',') {
                    variants.push(self.parse_type()?);
                }
                self.expect('>')?;
                OrcType::Union(variants)
            }
            other => return Err(self.error(&format!("unknown type '{}'", other))),
        })
    }

    fn length(&mut self, default: u32) -> Result<u32> {
        if self.accept('(') {
            let length = self.number()?;
            self.expect(')')?;
            Ok(length)
        } else {
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let text = "struct<id:bigint,price:decimal(10,2),code:char(3),tags:array<string>,attrs:map<string,int>,u:uniontype<int,date>>";
        let ty: OrcType = text.parse().unwrap();
        assert_eq!(ty.to_string(), text);

        let fields = ty.fields().unwrap();
        assert_eq!(fields[1].1, OrcType::Decimal { precision: 10, scale: 2 });
        assert_eq!(fields[2].1, OrcType::Char(3));
        assert!(!fields[3].1.is_primitive());
    }

    #[test]
    fn test_whitespace_defaults_and_quoting() {
        let ty: OrcType = " struct < `first name` : varchar , d : decimal > ".parse().unwrap();
        assert_eq!(
            ty,
            OrcType::Struct(vec![
                ("first name".to_string(), OrcType::VarChar(DEFAULT_VARCHAR_LENGTH)),
                ("d".to_string(), OrcType::Decimal { precision: 20, scale: 10 }),
            ])
        );
        assert_eq!(ty.to_string(), "struct<`first name`:varchar(65535),d:decimal(20,10)>");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "struct<a:int", "struct<a int>", "decimal(10,", "blob", "int extra"] {
            assert!(
                matches!(bad.parse::<OrcType>(), Err(FormatError::MalformedSchema(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_arrow_roundtrip() {
        let ty: OrcType = "struct<a:tinyint,b:varchar(20),c:decimal(9,3),d:timestamp,e:array<date>,f:map<string,binary>>"
            .parse()
            .unwrap();
        let schema = ty.to_arrow_schema().unwrap();
        assert_eq!(schema.field(0).data_type(), &DataType::Int8);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Decimal128(9, 3));
        assert!(schema.fields().iter().all(|f| f.is_nullable()));

        assert_eq!(OrcType::from_arrow_schema(&schema).unwrap(), ty);
    }

    #[test]
    fn test_unrecognized_arrow_type() {
        let schema = Schema::new(vec![Field::new("t", DataType::Time64(TimeUnit::Microsecond), true)]);
        assert!(matches!(
            OrcType::from_arrow_schema(&schema),
            Err(FormatError::UnrecognizedNativeType { .. })
        ));
        assert!(OrcType::Int.to_arrow_schema().is_err());
    }

    #[test]
    fn test_decimal_bounds() {
        for bad in ["decimal(0,0)", "decimal(39,2)", "decimal(300,2)", "decimal(5,6)", "decimal(10,4294967295)"] {
            assert!(
                matches!(bad.parse::<OrcType>(), Err(FormatError::MalformedSchema(_))),
                "{bad}"
            );
        }
        assert_eq!("decimal(38,38)".parse::<OrcType>().unwrap().to_arrow().unwrap(), DataType::Decimal128(38, 38));

        let wide = OrcType::Struct(vec![("d".to_string(), OrcType::Decimal { precision: 300, scale: 2 })]);
        assert!(matches!(wide.to_arrow_schema(), Err(FormatError::MalformedSchema(_))));
        assert!(OrcType::decimal(20, -1).is_err());
    }
}
