use contactdb_core::db::open_db_in_memory;
use contactdb_core::{
    ContactService, NewChildRecord, NewRawContact, RecordKind, RepoError, ServiceError, Subtype,
};

fn phone(value: &str, subtype: Subtype) -> NewChildRecord {
    NewChildRecord::with_value(value).subtype(subtype)
}

#[test]
fn second_primary_insert_demotes_first() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let first = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Home).primary())
        .unwrap();
    let second = svc
        .insert_child(raw, &RecordKind::Phone, phone("222", Subtype::Work).primary())
        .unwrap();

    assert!(!svc.get_child(first).unwrap().unwrap().is_primary);
    assert!(svc.get_child(second).unwrap().unwrap().is_primary);
}

#[test]
fn set_primary_moves_flag_between_siblings() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let first = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Home).primary())
        .unwrap();
    let second = svc
        .insert_child(raw, &RecordKind::Phone, phone("222", Subtype::Work))
        .unwrap();

    svc.set_primary(second).unwrap();
    assert!(!svc.get_child(first).unwrap().unwrap().is_primary);
    assert!(svc.get_child(second).unwrap().unwrap().is_primary);

    // Flipping an already-primary record is a harmless no-op.
    svc.set_primary(second).unwrap();
    assert!(svc.get_child(second).unwrap().unwrap().is_primary);
}

#[test]
fn set_primary_twice_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let first = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Home))
        .unwrap();
    let second = svc
        .insert_child(raw, &RecordKind::Phone, phone("222", Subtype::Work))
        .unwrap();
    let third = svc
        .insert_child(raw, &RecordKind::Phone, phone("333", Subtype::Mobile))
        .unwrap();

    svc.set_primary(second).unwrap();
    let after_once: Vec<_> = [first, second, third]
        .into_iter()
        .map(|id| svc.get_child(id).unwrap().unwrap())
        .collect();

    svc.set_primary(second).unwrap();
    let after_twice: Vec<_> = [first, second, third]
        .into_iter()
        .map(|id| svc.get_child(id).unwrap().unwrap())
        .collect();

    // The second flip changes nothing across the whole sibling set.
    assert_eq!(after_once, after_twice);
    assert!(after_twice[1].is_primary);
    assert!(!after_twice[0].is_primary);
    assert!(!after_twice[2].is_primary);
}

#[test]
fn set_primary_on_unknown_record_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);

    let err = svc.set_primary(4242).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::NotFound(4242))
    ));
}

#[test]
fn primaries_of_different_kinds_do_not_interfere() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let phone_id = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Mobile).primary())
        .unwrap();
    let email_id = svc
        .insert_child(
            raw,
            &RecordKind::Email,
            NewChildRecord::with_value("a@b.example")
                .subtype(Subtype::Home)
                .primary(),
        )
        .unwrap();

    assert!(svc.get_child(phone_id).unwrap().unwrap().is_primary);
    assert!(svc.get_child(email_id).unwrap().unwrap().is_primary);
}

#[test]
fn deleting_primary_promotes_best_ranked_sibling() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let home = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Home).primary())
        .unwrap();
    let work = svc
        .insert_child(raw, &RecordKind::Phone, phone("222", Subtype::Work))
        .unwrap();
    let mobile = svc
        .insert_child(raw, &RecordKind::Phone, phone("333", Subtype::Mobile))
        .unwrap();

    svc.delete_child(home).unwrap();

    // Mobile outranks work even though work has the lower id.
    assert!(svc.get_child(mobile).unwrap().unwrap().is_primary);
    assert!(!svc.get_child(work).unwrap().unwrap().is_primary);
}

#[test]
fn rank_ties_promote_the_lowest_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let pager = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Pager).primary())
        .unwrap();
    let other_first = svc
        .insert_child(raw, &RecordKind::Phone, phone("222", Subtype::Other))
        .unwrap();
    let other_second = svc
        .insert_child(raw, &RecordKind::Phone, phone("333", Subtype::Other))
        .unwrap();

    svc.delete_child(pager).unwrap();

    assert!(svc.get_child(other_first).unwrap().unwrap().is_primary);
    assert!(!svc.get_child(other_second).unwrap().unwrap().is_primary);
}

#[test]
fn deleting_last_sibling_leaves_no_primary_to_promote() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let only = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Mobile).primary())
        .unwrap();
    assert_eq!(svc.delete_child(only).unwrap(), 1);
    assert!(svc.get_child(only).unwrap().is_none());
}

#[test]
fn deleting_non_primary_leaves_primary_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let primary = svc
        .insert_child(raw, &RecordKind::Phone, phone("111", Subtype::Home).primary())
        .unwrap();
    let extra = svc
        .insert_child(raw, &RecordKind::Phone, phone("222", Subtype::Mobile))
        .unwrap();

    svc.delete_child(extra).unwrap();
    assert!(svc.get_child(primary).unwrap().unwrap().is_primary);
}
