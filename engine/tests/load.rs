//! End-to-end loads through the public API.

use csvmelt::{
    load, load_file, load_records, ExpansionMode, JsonSink, LoadConfig, LoadError, Record,
    RecordSink, RowError, Schema, SchemaDescriptor, LOG_BROADCASTER,
};
use std::io::Cursor;

#[derive(Debug, Default, Clone, PartialEq)]
struct Apple {
    name: String,
    origin: String,
    diameter: f64,
    edible: bool,
    discovered: u16,
}

impl Record for Apple {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("Name", "col:Name", |a: &mut Apple, v: String| a.name = v)
            .field("Origin", "mapConst:origin,col:Country", |a: &mut Apple, v: String| a.origin = v)
            .field("Diameter", "col:Diameter", |a: &mut Apple, v: f64| a.diameter = v)
            .field("Edible", "col:Edible", |a: &mut Apple, v: bool| a.edible = v)
            .field("Discovered", "", |a: &mut Apple, v: u16| a.discovered = v)
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Harvest {
    farm: String,
    year: i32,
    fruit: String,
    tonnes: f64,
}

fn harvest_schema(name: &str, melt: bool) -> Schema<Harvest> {
    let builder = Schema::<Harvest>::builder()
        .name(name)
        .field("Farm", "col:Farm,ignore:Notes", |h: &mut Harvest, v: String| h.farm = v)
        .field("Year", "intcols:colname", |h: &mut Harvest, v: i32| h.year = v);
    if melt {
        builder
            .field("Fruit", "melt:colname", |h: &mut Harvest, v: String| h.fruit = v)
            .field("Tonnes", "melt:value", |h: &mut Harvest, v: f64| h.tonnes = v)
            .build()
    } else {
        builder
            .field("Tonnes", "intcols:value", |h: &mut Harvest, v: f64| h.tonnes = v)
            .build()
    }
}

fn source(text: &str) -> Cursor<Vec<u8>> {
    LOG_BROADCASTER.set_echo(false);
    Cursor::new(text.as_bytes().to_vec())
}

#[test]
fn test_plain_load_with_precedence() {
    let mut csv = source("Name;Country;Diameter;Edible;Year\nCox;UK;6,5;yes;1830\nGala;NZ;7;No;1934\n");
    let config = LoadConfig::default()
        .with_constant("origin", "Orchard")
        .with_column("Discovered", 5);

    let report = load::<Apple, _>(&mut csv, b';', &config).unwrap();
    assert_eq!(report.mode, ExpansionMode::Plain);
    let (apples, errors) = report.into_parts();
    assert!(errors.is_none());
    assert_eq!(
        apples[0],
        Apple {
            name: "Cox".into(),
            origin: "Orchard".into(),
            diameter: 6.5,
            edible: true,
            discovered: 1830,
        }
    );
    assert!(!apples[1].edible);
    assert_eq!(apples[1].discovered, 1934);
}

#[test]
fn test_int_columns_one_record_per_year() {
    let mut csv = source("Farm,1998,1999,Notes\nHill,12,15,dry\nVale,3,4%,\n");
    let schema = harvest_schema("tests::IntOnly", false);

    let report = load_records(&mut csv, b',', &schema, &LoadConfig::default()).unwrap();
    assert_eq!(report.mode, ExpansionMode::IntOnly);
    assert_eq!(report.records.len(), 4);

    let years: Vec<i32> = report.records.iter().map(|h| h.year).collect();
    assert_eq!(years, vec![1998, 1999, 1998, 1999]);
    assert_eq!(report.records[1].tonnes, 15.0);
    assert_eq!(report.records[3].farm, "Vale");
    assert_eq!(report.records[3].tonnes, 0.04);
}

#[test]
fn test_cross_expansion_full_product() {
    let mut csv = source("Farm;1998;1999;Apples;Pears;Plums;Notes\nHill;1;2;10;20;30;x\n");
    let schema = harvest_schema("tests::Cross", true);

    let report = load_records(&mut csv, b';', &schema, &LoadConfig::default()).unwrap();
    assert_eq!(report.mode, ExpansionMode::Cross);
    assert_eq!(report.records.len(), 6);

    let pairs: Vec<(i32, &str)> = report
        .records
        .iter()
        .map(|h| (h.year, h.fruit.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (1998, "Apples"),
            (1998, "Pears"),
            (1998, "Plums"),
            (1999, "Apples"),
            (1999, "Pears"),
            (1999, "Plums"),
        ]
    );
    // melt values come from the melt column, not the year column
    assert_eq!(report.records[2].tonnes, 30.0);
}

#[test]
fn test_first_row_is_data() {
    let mut csv = source("Cox,6.5\nGala,7\n");
    let schema = Schema::<Apple>::builder()
        .name("tests::Headerless")
        .field("Name", "", |a: &mut Apple, v: String| a.name = v)
        .field("Diameter", "", |a: &mut Apple, v: f64| a.diameter = v)
        .build();
    let config = LoadConfig {
        first_row_is_data: true,
        ..LoadConfig::default()
    }
    .with_column("Name", 1)
    .with_column("Diameter", 2);

    let report = load_records(&mut csv, b',', &schema, &config).unwrap();
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.records[0].name, "Cox");
    assert_eq!(report.records[1].diameter, 7.0);
}

#[test]
fn test_constant_wins_over_absent_column() {
    // no Country header, but Origin is served by its constant first
    let mut csv = source("Name;Diameter;Edible\nCox;6;y\nGala;7;n\n");
    let config = LoadConfig::default().with_constant("origin", "Orchard");

    let report = load::<Apple, _>(&mut csv, b';', &config).unwrap();
    assert!(report.is_ok());
    let (apples, errors) = report.into_parts();
    assert!(errors.is_none());
    assert_eq!(apples.len(), 2);
    assert_eq!(apples[1].origin, "Orchard");
    assert_eq!(apples[1].discovered, 0);
}

#[test]
fn test_missing_header_reported_per_row() {
    let mut csv = source("Name;Diameter\nCox;6\nGala;7\n");
    let config = LoadConfig::default().with_constant("origin", "Orchard");
    let schema = Schema::<Apple>::builder()
        .name("tests::Missing")
        .field("Name", "col:Name", |a: &mut Apple, v: String| a.name = v)
        .field("Edible", "col:Edible", |a: &mut Apple, v: bool| a.edible = v)
        .build();

    let report = load_records(&mut csv, b';', &schema, &config).unwrap();
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.rows_dropped, 0);
    assert_eq!(
        report.errors,
        vec![
            RowError::MissingColumn { row: 2, field: "Edible".into(), column: "Edible".into() },
            RowError::MissingColumn { row: 3, field: "Edible".into(), column: "Edible".into() },
        ]
    );
}

#[test]
fn test_bad_cell_drops_only_its_row() {
    let mut csv = source("Farm,1998,1999\nHill,1,2\nVale,3,lots\nDale,5,6\n");
    let config = LoadConfig {
        fail_on_unparseable_number: true,
        ..LoadConfig::default()
    };
    let schema = harvest_schema("tests::Dropped", false);

    let report = load_records(&mut csv, b',', &schema, &config).unwrap();
    assert_eq!(report.rows_read, 3);
    assert_eq!(report.rows_dropped, 1);
    let farms: Vec<&str> = report.records.iter().map(|h| h.farm.as_str()).collect();
    assert_eq!(farms, vec!["Hill", "Hill", "Dale", "Dale"]);
    assert!(matches!(&report.errors[0], RowError::Conversion { row: 3, .. }));
}

#[test]
fn test_unparseable_float_is_nan_by_default() {
    let mut csv = source("Farm,1998\nHill,n/a\n");
    let schema = harvest_schema("tests::Nan", false);

    let report = load_records(&mut csv, b',', &schema, &LoadConfig::default()).unwrap();
    assert!(report.is_ok());
    assert!(report.records[0].tonnes.is_nan());
}

#[test]
fn test_mapped_column_out_of_range_is_fatal() {
    let mut csv = source("Name;Diameter\nCox;6\n");
    let config = LoadConfig::default()
        .with_constant("origin", "Orchard")
        .with_column("Discovered", 3);

    let err = load::<Apple, _>(&mut csv, b';', &config).unwrap_err();
    assert!(matches!(err, LoadError::Configuration { index: 3, row_len: 2, .. }));
}

#[test]
fn test_unsupported_field_type_is_fatal() {
    let descriptor = SchemaDescriptor::from_json(
        r#"{"name": "tests::Picked", "fields": [{"name": "Picked", "type": "date", "tag": "col:Picked"}]}"#,
    )
    .unwrap();
    let mut csv = source("Picked\n2024-09-01\n");

    let err = load_records(&mut csv, b',', &descriptor.to_schema(), &LoadConfig::default()).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFieldType { ref type_name, .. } if type_name == "date"));
}

#[test]
fn test_windows_1252_source() {
    LOG_BROADCASTER.set_echo(false);
    // "Hof;Ernte\nMüller;1,5\n" in windows-1252
    let mut bytes = b"Hof;Ernte\nM".to_vec();
    bytes.push(0xFC);
    bytes.extend_from_slice(b"ller;1,5\n");
    let mut csv = Cursor::new(bytes);

    let schema = Schema::<Harvest>::builder()
        .name("tests::German")
        .field("Farm", "col:Hof", |h: &mut Harvest, v: String| h.farm = v)
        .field("Tonnes", "col:Ernte", |h: &mut Harvest, v: f64| h.tonnes = v)
        .build();
    let config = LoadConfig {
        encoding: Some("windows-1252".into()),
        ..LoadConfig::default()
    };

    let report = load_records(&mut csv, b';', &schema, &config).unwrap();
    assert_eq!(report.encoding, "windows-1252");
    assert_eq!(report.records[0].farm, "Müller");
    assert_eq!(report.records[0].tonnes, 1.5);
}

#[test]
fn test_descriptor_load_to_json_file() {
    LOG_BROADCASTER.set_echo(false);
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("harvest.csv");
    std::fs::write(&csv_path, "Farm;Apples;Pears\nHill;10;2,5\n").unwrap();

    let descriptor = SchemaDescriptor::from_json(
        r#"{
            "name": "tests::Json",
            "fields": [
                { "name": "farm", "type": "string", "tag": "col:Farm" },
                { "name": "fruit", "type": "string", "tag": "melt:colname" },
                { "name": "tonnes", "type": "f64", "tag": "melt:value" },
                { "name": "organic", "type": "bool" }
            ]
        }"#,
    )
    .unwrap();

    let report = load_file(&csv_path, None, &descriptor.to_schema(), &LoadConfig::default()).unwrap();
    assert_eq!(report.delimiter, b';');
    assert_eq!(report.mode, ExpansionMode::MeltOnly);

    let out_path = dir.path().join("harvest.json");
    let mut sink = JsonSink::new(std::fs::File::create(&out_path).unwrap());
    assert_eq!(sink.persist(report.records.as_slice()).unwrap(), 2);
    drop(sink);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(written[0]["fruit"], "Apples");
    assert_eq!(written[1]["tonnes"], 2.5);
    assert_eq!(written[1]["organic"], false);
}
