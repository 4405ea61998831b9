//! Round-trip Integration Tests
//!
//! Every (schema, field, value) triple of a row must come back out of the
//! metadata documents written for it.

use std::collections::BTreeSet;
use std::fs;

use csv2saf::core::{metadata_filename, parse_metadata};
use csv2saf::{Archive, LayoutSettings, ParseSettings};
use tempfile::TempDir;

type Triple = (String, String, String);

fn triples_from_item(item: &csv2saf::Item) -> BTreeSet<Triple> {
    item.metadata()
        .iter()
        .map(|v| (v.field.schema.clone(), v.field.to_string(), v.value.clone()))
        .collect()
}

#[test]
fn test_metadata_round_trip() {
    let input = "\
dc.title;dc.contributor.author;local.note[en];dc.subject;dc.title.alternative
Fish & Chips;Alice||Bob;<b>bold</b> \"quoted\";history;Alt
Second;Carol;;;
";

    let archive = Archive::parse(input, ".", &ParseSettings::default()).unwrap();
    let output = TempDir::new().unwrap();
    archive.write(output.path(), &LayoutSettings::default()).unwrap();

    for (index, item) in archive.items().iter().enumerate() {
        let dir = output.path().join(format!("item_{:03}", index + 1));

        let mut written = BTreeSet::new();
        for schema in item.used_schemas() {
            let xml = fs::read_to_string(dir.join(metadata_filename(schema))).unwrap();
            let doc = parse_metadata(&xml).unwrap();
            assert_eq!(doc.schema, schema);
            for value in doc.values {
                assert_eq!(value.field.schema, schema);
                written.insert((value.field.schema.clone(), value.field.to_string(), value.value));
            }
        }

        assert_eq!(written, triples_from_item(item));
    }
}

#[test]
fn test_item_count_matches_data_rows() {
    let input = "\
# exported sheet
dc.title
A
# B is withdrawn
C

D # trailing note
";

    let archive = Archive::parse(input, ".", &ParseSettings::default()).unwrap();
    let output = TempDir::new().unwrap();
    let summary = archive.write(output.path(), &LayoutSettings::default()).unwrap();

    assert_eq!(archive.len(), 3);
    assert_eq!(summary.items, 3);
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 3);
}
