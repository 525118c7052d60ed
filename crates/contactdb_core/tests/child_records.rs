use contactdb_core::db::open_db_in_memory;
use contactdb_core::model::record::slot;
use contactdb_core::{
    ContactService, NewChildRecord, NewRawContact, RecordKind, ServiceError, Subtype,
    ValidationError,
};

#[test]
fn inserting_phone_creates_reverse_lookup_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let payload = NewChildRecord::with_value("(650) 555-1234").subtype(Subtype::Mobile);
    let data_id = svc.insert_child(raw, &RecordKind::Phone, payload).unwrap();

    // Formatting differences must not matter for lookup.
    let hits = svc.lookup_phone("650 555 1234").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].data_id, data_id);
    assert_eq!(hits[0].raw_contact_id, raw);

    let record = svc.get_child(data_id).unwrap().unwrap();
    assert_eq!(record.slots.get(slot::NORMALIZED_NUMBER), Some("4321555056"));
}

#[test]
fn deleting_phone_removes_lookup_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let payload = NewChildRecord::with_value("555-1234").subtype(Subtype::Home);
    let data_id = svc.insert_child(raw, &RecordKind::Phone, payload).unwrap();
    assert_eq!(svc.lookup_phone("555-1234").unwrap().len(), 1);

    assert_eq!(svc.delete_child(data_id).unwrap(), 1);
    assert!(svc.lookup_phone("555-1234").unwrap().is_empty());
}

#[test]
fn unnormalizable_number_matches_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let svc = ContactService::with_defaults(&mut conn);
    assert!(svc.lookup_phone("call me maybe").unwrap().is_empty());
}

#[test]
fn custom_subtype_without_label_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let payload = NewChildRecord::with_value("555-1234").subtype(Subtype::Custom);
    let err = svc
        .insert_child(raw, &RecordKind::Phone, payload)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::CustomSubtypeRequiresLabel { .. })
    ));
}

#[test]
fn absent_subtype_defaults_to_custom_and_requires_label() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let bare = NewChildRecord::with_value("a@b.example");
    let err = svc.insert_child(raw, &RecordKind::Email, bare).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::CustomSubtypeRequiresLabel { .. })
    ));

    let labeled = NewChildRecord::with_value("a@b.example").label("newsletter");
    assert!(svc.insert_child(raw, &RecordKind::Email, labeled).is_ok());
}

#[test]
fn label_with_named_subtype_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let payload = NewChildRecord::with_value("a@b.example")
        .subtype(Subtype::Work)
        .label("work-ish");
    let err = svc
        .insert_child(raw, &RecordKind::Email, payload)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::LabelRequiresCustomSubtype { .. })
    ));
}

#[test]
fn full_name_is_split_into_components() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let data_id = svc
        .insert_child(raw, &RecordKind::Name, NewChildRecord::with_value("Jane Doe"))
        .unwrap();

    let record = svc.get_child(data_id).unwrap().unwrap();
    assert_eq!(record.value(), Some("Jane Doe"));
    assert_eq!(record.slots.get(slot::GIVEN_NAME), Some("Jane"));
    assert_eq!(record.slots.get(slot::FAMILY_NAME), Some("Doe"));
}

#[test]
fn name_components_synthesize_full_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let mut payload = NewChildRecord::default();
    payload.slots.set(slot::GIVEN_NAME, "Jane");
    payload.slots.set(slot::FAMILY_NAME, "Doe");
    let data_id = svc.insert_child(raw, &RecordKind::Name, payload).unwrap();

    let record = svc.get_child(data_id).unwrap().unwrap();
    assert_eq!(record.value(), Some("Jane Doe"));
    assert_eq!(svc.display_name(raw).unwrap().as_deref(), Some("Jane Doe"));
}

#[test]
fn synthesized_full_name_excludes_prefix_middle_and_suffix() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let mut payload = NewChildRecord::default();
    payload.slots.set(slot::PREFIX, "Dr");
    payload.slots.set(slot::GIVEN_NAME, "Jane");
    payload.slots.set(slot::MIDDLE_NAME, "Q");
    payload.slots.set(slot::FAMILY_NAME, "Doe");
    payload.slots.set(slot::SUFFIX, "Jr");
    let data_id = svc.insert_child(raw, &RecordKind::Name, payload).unwrap();

    let record = svc.get_child(data_id).unwrap().unwrap();
    assert_eq!(record.value(), Some("Jane Doe"));
    assert_eq!(svc.display_name(raw).unwrap().as_deref(), Some("Jane Doe"));
}

#[test]
fn family_name_alone_becomes_the_full_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let mut payload = NewChildRecord::default();
    payload.slots.set(slot::FAMILY_NAME, "Doe");
    let data_id = svc.insert_child(raw, &RecordKind::Name, payload).unwrap();

    let record = svc.get_child(data_id).unwrap().unwrap();
    assert_eq!(record.value(), Some("Doe"));
}

#[test]
fn deleting_unknown_child_affects_zero_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    assert_eq!(svc.delete_child(4242).unwrap(), 0);
}

#[test]
fn hard_deleting_raw_contact_cascades_to_children() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let payload = NewChildRecord::with_value("555-1234").subtype(Subtype::Mobile);
    let data_id = svc.insert_child(raw, &RecordKind::Phone, payload).unwrap();

    assert_eq!(svc.hard_delete_raw_contact(raw).unwrap(), 1);
    assert!(svc.get_child(data_id).unwrap().is_none());
    assert!(svc.lookup_phone("555-1234").unwrap().is_empty());
}

#[test]
fn delete_children_of_removes_every_row_with_fixups() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    svc.insert_child(raw, &RecordKind::Name, NewChildRecord::with_value("Jane Doe"))
        .unwrap();
    svc.insert_child(
        raw,
        &RecordKind::Phone,
        NewChildRecord::with_value("555-1234").subtype(Subtype::Mobile),
    )
    .unwrap();

    assert_eq!(svc.delete_children_of(raw).unwrap(), 2);
    assert_eq!(svc.display_name(raw).unwrap(), None);
    assert!(svc.lookup_phone("555-1234").unwrap().is_empty());
}
