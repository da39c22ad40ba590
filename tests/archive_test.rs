//! Integration tests for the archive facade

use dune_archive::{Archive, ArchiveConfig, ArchiveError, Value};
use rand::seq::SliceRandom;
use rand::thread_rng;
use tempfile::TempDir;

const HOUSE_FIELDS: [(&str, &str); 6] = [
    ("name", "str"),
    ("origin", "str"),
    ("leader", "str"),
    ("military_strength", "int"),
    ("wealth", "int"),
    ("spice_production", "int"),
];

fn open(dir: &TempDir) -> Archive {
    Archive::open(ArchiveConfig::new(dir.path())).unwrap()
}

fn house(name: &str, origin: &str, leader: &str, strength: i64, wealth: i64, spice: i64) -> Vec<Value> {
    vec![
        Value::from(name),
        Value::from(origin),
        Value::from(leader),
        Value::Integer(strength),
        Value::Integer(wealth),
        Value::Integer(spice),
    ]
}

#[test]
fn test_house_scenario() {
    let dir = TempDir::new().unwrap();
    let mut archive = open(&dir);

    archive.create_type("house", &HOUSE_FIELDS, 0).unwrap();

    let atreides = house("Atreides", "Caladan", "Duke", 8000, 5000, 150);
    archive.create_record("house", &atreides).unwrap();

    let key = Value::from("Atreides");
    assert_eq!(archive.search_record("house", &key).unwrap(), Some(atreides.clone()));

    let imposter = house("Atreides", "Giedi", "Baron", 1, 2, 3);
    assert!(matches!(
        archive.create_record("house", &imposter),
        Err(ArchiveError::DuplicateKey { .. })
    ));
    assert_eq!(archive.search_record("house", &key).unwrap(), Some(atreides));

    assert!(archive.delete_record("house", &key).unwrap());
    assert_eq!(archive.search_record("house", &key).unwrap(), None);
}

#[test]
fn test_duplicate_type_regardless_of_fields() {
    let dir = TempDir::new().unwrap();
    let mut archive = open(&dir);

    archive.create_type("house", &HOUSE_FIELDS, 0).unwrap();
    assert!(matches!(
        archive.create_type("house", &[("x", "int")], 0),
        Err(ArchiveError::DuplicateType(_))
    ));
    assert!(matches!(
        archive.create_type("house", &HOUSE_FIELDS, 2),
        Err(ArchiveError::DuplicateType(_))
    ));
    assert_eq!(archive.catalog().get_schema("house").unwrap().field_count(), 6);
}

#[test]
fn test_delete_absent_key_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut archive = open(&dir);
    archive.create_type("house", &HOUSE_FIELDS, 0).unwrap();

    let harkonnen = house("Harkonnen", "Giedi", "Baron", 9000, 9000, 300);
    archive.create_record("house", &harkonnen).unwrap();

    assert!(!archive.delete_record("house", &Value::from("Corrino")).unwrap());
    assert_eq!(
        archive.search_record("house", &Value::from("Harkonnen")).unwrap(),
        Some(harkonnen)
    );
}

#[test]
fn test_eleven_records_span_two_pages() {
    let dir = TempDir::new().unwrap();
    let mut archive = open(&dir);
    archive.create_type("house", &HOUSE_FIELDS, 0).unwrap();

    let mut names: Vec<String> = (0..11).map(|i| format!("House{}", i)).collect();
    names.shuffle(&mut thread_rng());

    for (i, name) in names.iter().enumerate() {
        let record = house(name, "Somewhere", "Lord", i as i64, 0, 0);
        archive.create_record("house", &record).unwrap();
    }
    assert_eq!(archive.page_count("house").unwrap(), 2);

    names.shuffle(&mut thread_rng());
    for name in &names {
        let found = archive
            .search_record("house", &Value::from(name.as_str()))
            .unwrap()
            .unwrap();
        assert_eq!(found[0], Value::from(name.as_str()));
    }
    assert_eq!(archive.scan_records("house").unwrap().len(), 11);
}

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let ordos = house("Ordos", "Sigma Draconis", "Executrix", 3000, 12000, 40);
    {
        let mut archive = open(&dir);
        archive.create_type("house", &HOUSE_FIELDS, 0).unwrap();
        archive.create_record("house", &ordos).unwrap();
        archive
            .create_record("house", &house("Moritani", "Grumman", "Viscount", 4000, 1000, 10))
            .unwrap();
        assert!(archive.delete_record("house", &Value::from("Moritani")).unwrap());
    }

    let mut archive = open(&dir);
    assert!(archive.catalog().contains("house"));
    assert_eq!(
        archive.search_record("house", &Value::from("Ordos")).unwrap(),
        Some(ordos)
    );
    assert_eq!(
        archive.search_record("house", &Value::from("Moritani")).unwrap(),
        None
    );
    assert!(matches!(
        archive.create_type("house", &HOUSE_FIELDS, 0),
        Err(ArchiveError::DuplicateType(_))
    ));
}

#[test]
fn test_integer_primary_key() {
    let dir = TempDir::new().unwrap();
    let mut archive = open(&dir);
    archive
        .create_type("fremen", &[("name", "str"), ("tribe", "str"), ("id", "int")], 2)
        .unwrap();

    let stilgar = vec![Value::from("Stilgar"), Value::from("SietchTabr"), Value::Integer(9)];
    archive.create_record("fremen", &stilgar).unwrap();

    // Same name, different key: allowed
    archive
        .create_record(
            "fremen",
            &[Value::from("Stilgar"), Value::from("Other"), Value::Integer(10)],
        )
        .unwrap();
    assert!(matches!(
        archive.create_record(
            "fremen",
            &[Value::from("Chani"), Value::from("SietchTabr"), Value::Integer(9)],
        ),
        Err(ArchiveError::DuplicateKey { .. })
    ));
    assert_eq!(
        archive.search_record("fremen", &Value::Integer(9)).unwrap(),
        Some(stilgar)
    );
}

#[test]
fn test_overlong_string_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut archive = open(&dir);
    archive.create_type("house", &HOUSE_FIELDS, 0).unwrap();

    let long_name = "A".repeat(33);
    let record = house(&long_name, "Caladan", "Duke", 1, 1, 1);
    assert!(matches!(
        archive.create_record("house", &record),
        Err(ArchiveError::FieldTooLong { len: 33, max: 32, .. })
    ));
    assert!(archive.scan_records("house").unwrap().is_empty());
}

#[test]
fn test_hyphenated_names_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut archive = open(&dir);
        archive
            .create_type("spice-harvester", &[("home-world", "str"), ("crew", "int")], 0)
            .unwrap();
        archive
            .create_record("spice-harvester", &[Value::from("Arrakis"), Value::Integer(6)])
            .unwrap();
    }

    assert!(dir.path().join("pages").join("spice-harvester.bin").exists());

    let mut archive = open(&dir);
    let schema = archive.catalog().get_schema("spice-harvester").unwrap();
    assert_eq!(schema.primary_key_field().name(), "home-world");
    assert_eq!(
        archive
            .search_record("spice-harvester", &Value::from("Arrakis"))
            .unwrap(),
        Some(vec![Value::from("Arrakis"), Value::Integer(6)])
    );
}
