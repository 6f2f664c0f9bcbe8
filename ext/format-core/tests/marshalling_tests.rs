use format_core::parquet::catalog as parquet_ids;
use format_core::parquet::{ParquetRowReader, ParquetWriterBuilder};
use format_core::*;
use proptest::prelude::*;

mod test_helpers;
use test_helpers::*;

#[test]
fn test_single_field_wire_form() -> TestResult {
    let schema = SchemaDescription::new().with_field(
        FieldDescriptor::new("f1", "pf1", CanonicalType::String)
            .with_default("x")
            .with_allow_null(false),
    );
    let text = schema.marshall()?;
    assert_eq!(text, "f1|pf1|2|x|false\n");
    assert_eq!(SchemaDescription::unmarshall(&text)?, schema);
    Ok(())
}

#[test]
fn test_unmarshalled_schema_drives_a_writer() -> TestResult {
    let text = all_types_schema().marshall()?;
    assert_eq!(text.lines().count(), 8);
    assert!(text.starts_with("id|ID|5||false\n"));

    let schema = SchemaDescription::unmarshall(&text)?;
    let rows = sample_rows(6);
    let read = parquet_roundtrip(&schema, &rows, ParquetWriterBuilder::new())?;
    assert_eq!(read, rows);
    Ok(())
}

#[test]
fn test_format_fields_pin_native_types() -> TestResult {
    let text = "amount|AMOUNT|14|6|12|3\n";
    let format_fields = FormatFieldList::unmarshall(text)?;
    assert_eq!(format_fields.len(), 1);
    let amount = format_fields.find("amount").expect("amount override");
    assert_eq!(amount.format_type_id, parquet_ids::DECIMAL_INT64);
    assert_eq!((amount.precision, amount.scale), (Some(12), Some(3)));
    assert_eq!(format_fields.marshall()?, text);

    let schema = SchemaDescription::new()
        .with_field(FieldDescriptor::new("amount", "AMOUNT", CanonicalType::BigNumber));
    let rows = vec![vec![Some(CanonicalValue::BigNumber("123456789.125".parse()?))]];
    let data = write_parquet(
        &schema,
        &rows,
        ParquetWriterBuilder::new().with_format_fields(format_fields.clone()),
    )?;

    // Introspection reports the pinned entry back
    let reader = ParquetRowReader::new(data)?;
    assert_eq!(reader.schema().fields()[0].canonical_type, CanonicalType::BigNumber);
    let read = reader.collect::<Result<Vec<_>>>()?;
    assert_eq!(read, rows);
    Ok(())
}

#[test]
fn test_malformed_records_are_rejected() {
    assert!(matches!(
        SchemaDescription::unmarshall("f1|pf1|2|x\n"),
        Err(FormatError::MalformedField(_))
    ));
    assert!(matches!(
        SchemaDescription::unmarshall("f1|pf1|2|x|false|extra\n"),
        Err(FormatError::MalformedField(_))
    ));
    assert!(matches!(
        SchemaDescription::unmarshall("f1|pf1|99||true\n"),
        Err(FormatError::MalformedSchema(_))
    ));
    assert!(matches!(
        SchemaDescription::unmarshall("f1|pf1|2||maybe\n"),
        Err(FormatError::MalformedSchema(_))
    ));
    assert!(matches!(
        FormatFieldList::unmarshall("a|A|0|1|p|\n"),
        Err(FormatError::MalformedSchema(_))
    ));

    let piped = SchemaDescription::new().with_field(FieldDescriptor::new("a|b", "AB", CanonicalType::String));
    assert!(matches!(piped.marshall(), Err(FormatError::MalformedField(_))));
}

#[test]
fn test_json_form_matches_text_form() -> TestResult {
    let schema = all_types_schema();
    let json = serde_json::to_string(&schema)?;
    let from_json: SchemaDescription = serde_json::from_str(&json)?;
    assert_eq!(from_json, schema);
    assert_eq!(from_json.marshall()?, schema.marshall()?);
    Ok(())
}

fn component() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_ .-]{1,12}"
}

fn canonical_type() -> impl Strategy<Value = CanonicalType> {
    prop::sample::select(vec![
        CanonicalType::Number,
        CanonicalType::Integer,
        CanonicalType::String,
        CanonicalType::Boolean,
        CanonicalType::Date,
        CanonicalType::Timestamp,
        CanonicalType::BigNumber,
        CanonicalType::Binary,
    ])
}

proptest! {
    #[test]
    fn prop_schema_text_roundtrip(
        fields in prop::collection::vec(
            (component(), component(), canonical_type(), prop::option::of(component()), any::<bool>()),
            0..8,
        )
    ) {
        let schema = SchemaDescription::from_fields(
            fields
                .into_iter()
                .map(|(format, canonical, ty, default, allow_null)| {
                    let field = FieldDescriptor::new(format, canonical, ty).with_allow_null(allow_null);
                    match default {
                        Some(default) => field.with_default(default),
                        None => field,
                    }
                })
                .collect(),
        );
        let text = schema.marshall().unwrap();
        prop_assert_eq!(text.lines().count(), schema.len());
        prop_assert_eq!(SchemaDescription::unmarshall(&text).unwrap(), schema);
    }
}
