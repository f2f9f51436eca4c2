//! End-to-end reconciliation scenarios against a real tempdir-backed
//! legacy store: both representations are seeded with matching records and
//! every operation is checked on both sides.

use rust_decimal_macros::dec;
use tempfile::TempDir;

use gymbook::core::schema;
use gymbook::legacy::{LegacyValue, CLASS_TABLE, STUDENT_TABLE};
use gymbook::{
    EditKind, EntityKind, EntityStore, GymError, LegacyStore, LegacyTable, Reconciler, Row, Value,
};

fn set_legacy(table: &mut LegacyTable, pos: usize, field: &str, value: LegacyValue) {
    let idx = table.field_index(field).unwrap();
    table.records[pos].values[idx] = value;
}

fn seed_student(
    store: &mut EntityStore,
    legacy: &mut LegacyStore,
    student_id: i64,
    student_no: i64,
    fname: &str,
    lname: &str,
    family_id: i64,
) {
    let table = store.table_mut(EntityKind::Student).unwrap();
    let mut values: Vec<Value> = table
        .columns
        .iter()
        .map(|c| c.data_type.empty_value())
        .collect();
    for (col, v) in [
        ("STUDENT_ID", Value::Integer(student_id)),
        ("STUDENTNO", Value::Integer(student_no)),
        ("FNAME", Value::Text(fname.to_string())),
        ("LNAME", Value::Text(lname.to_string())),
        ("FAMILY_ID", Value::Integer(family_id)),
        ("ACTIVE", Value::Boolean(true)),
    ] {
        values[table.column_index(col).unwrap()] = v;
    }
    table.insert(Row::new(values)).unwrap();

    let table = legacy.table_mut(STUDENT_TABLE).unwrap();
    let pos = table.push_default_record();
    set_legacy(table, pos, "STUDENTNO", LegacyValue::Num(student_no.into()));
    set_legacy(table, pos, "FNAME", LegacyValue::Str(fname.to_string()));
    set_legacy(table, pos, "LNAME", LegacyValue::Str(lname.to_string()));
    set_legacy(table, pos, "ACTIVE", LegacyValue::Bool(true));
}

fn seed_class(
    store: &mut EntityStore,
    legacy: &mut LegacyStore,
    class_id: i64,
    max: i64,
    available: i64,
    slot_student_nos: &[i64],
) {
    let table = store.table_mut(EntityKind::Class).unwrap();
    table
        .insert(Row::new(vec![
            Value::Integer(class_id),
            Value::Text("KIM".to_string()),
            Value::Text(format!("CLASS {class_id}")),
            Value::Text("4:30 PM".to_string()),
            Value::Text("TUE".to_string()),
            Value::Integer(max),
            Value::Integer(available),
        ]))
        .unwrap();

    let table = legacy.table_mut(CLASS_TABLE).unwrap();
    let pos = table.push_default_record();
    set_legacy(table, pos, "CLASS_ID", LegacyValue::Num(class_id.into()));
    set_legacy(table, pos, "MAX", LegacyValue::Num(max.into()));
    set_legacy(table, pos, "AVAILABLE", LegacyValue::Num(available.into()));
    for (i, no) in slot_student_nos.iter().enumerate() {
        set_legacy(
            table,
            pos,
            &format!("S{}NO", i + 1),
            LegacyValue::Num((*no).into()),
        );
    }
}

fn link(store: &mut EntityStore, class_id: i64, student_id: i64, active: bool) {
    store
        .table_mut(EntityKind::Roster)
        .unwrap()
        .insert(Row::new(vec![
            Value::Integer(class_id),
            Value::Integer(student_id),
            Value::Boolean(active),
        ]))
        .unwrap();
}

fn setup() -> (EntityStore, LegacyStore, TempDir) {
    let mut store = EntityStore::new();
    let dir = tempfile::tempdir().unwrap();
    let mut legacy = LegacyStore::open(dir.path()).unwrap();
    seed_student(&mut store, &mut legacy, 1, 1042, "MARIA", "LOPEZ", 5);
    seed_student(&mut store, &mut legacy, 7, 1077, "ALEX", "REED", 6);
    (store, legacy, dir)
}

fn legacy_student_field(legacy: &LegacyStore, pos: usize, field: &str) -> LegacyValue {
    legacy
        .table(STUDENT_TABLE)
        .unwrap()
        .get(pos, field)
        .unwrap()
        .clone()
}

#[test]
fn update_uppercases_and_writes_through() {
    let (mut store, mut legacy, _dir) = setup();
    Reconciler::new(&mut store, &mut legacy, 2025)
        .update_student_info(
            1,
            &[
                ("FNAME".to_string(), "maria".to_string()),
                ("CITY".to_string(), "austin".to_string()),
            ],
            EditKind::General,
            2025,
        )
        .unwrap();

    let students = store.table(EntityKind::Student).unwrap();
    let pos = store.student_row(1).unwrap();
    assert_eq!(
        students.get_field(pos, "FNAME").unwrap(),
        &Value::Text("MARIA".to_string())
    );
    assert_eq!(
        students.get_field(pos, "CITY").unwrap(),
        &Value::Text("AUSTIN".to_string())
    );
    assert_eq!(
        legacy_student_field(&legacy, 0, "CITY"),
        LegacyValue::Str("AUSTIN".to_string())
    );
}

#[test]
fn payment_insert_clears_bill() {
    let (mut store, mut legacy, _dir) = setup();
    // Outstanding bill for March 2025.
    store
        .table_mut(EntityKind::Bill)
        .unwrap()
        .insert(Row::new(vec![
            Value::Integer(1),
            Value::Integer(3),
            Value::Integer(2025),
        ]))
        .unwrap();

    Reconciler::new(&mut store, &mut legacy, 2025)
        .update_student_info(
            1,
            &[("MARPAY".to_string(), "45.00".to_string())],
            EditKind::Payment,
            2025,
        )
        .unwrap();

    let payments = store.table(EntityKind::Payment).unwrap();
    assert_eq!(payments.rows.len(), 1);
    assert_eq!(
        payments.get_field(0, "AMOUNT").unwrap(),
        &Value::Numeric(dec!(45.00))
    );
    assert!(store.table(EntityKind::Bill).unwrap().rows.is_empty());
    assert_eq!(
        legacy_student_field(&legacy, 0, "MARPAY"),
        LegacyValue::Num(dec!(45.00))
    );
}

#[test]
fn zero_amount_deletes_payment() {
    let (mut store, mut legacy, _dir) = setup();
    {
        let mut reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
        reconciler
            .update_student_info(
                1,
                &[("MARPAY".to_string(), "45.00".to_string())],
                EditKind::Payment,
                2025,
            )
            .unwrap();
        reconciler
            .update_student_info(
                1,
                &[("MARPAY".to_string(), "0".to_string())],
                EditKind::Payment,
                2025,
            )
            .unwrap();
    }
    assert!(store.table(EntityKind::Payment).unwrap().rows.is_empty());
    assert_eq!(
        legacy_student_field(&legacy, 0, "MARPAY"),
        LegacyValue::Num(0.into())
    );
}

#[test]
fn payment_date_subfield_updates_in_place() {
    let (mut store, mut legacy, _dir) = setup();
    let mut reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
    reconciler
        .update_student_info(
            1,
            &[("MARPAY".to_string(), "45.00".to_string())],
            EditKind::Payment,
            2025,
        )
        .unwrap();
    reconciler
        .update_student_info(
            1,
            &[("MARDATE".to_string(), "03/02/2025".to_string())],
            EditKind::Payment,
            2025,
        )
        .unwrap();

    let payments = store.table(EntityKind::Payment).unwrap();
    assert_eq!(payments.rows.len(), 1);
    assert_eq!(
        payments.get_field(0, "DATEPAID").unwrap(),
        &Value::Date(chrono::NaiveDate::from_ymd_opt(2025, 3, 2).unwrap())
    );
}

#[test]
fn bill_toggle_and_marker_polarity() {
    let (mut store, mut legacy, _dir) = setup();
    // Bill row exists for (student 7, March, 2025).
    store
        .table_mut(EntityKind::Bill)
        .unwrap()
        .insert(Row::new(vec![
            Value::Integer(7),
            Value::Integer(3),
            Value::Integer(2025),
        ]))
        .unwrap();

    let mut reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
    // Toggle off: row deleted, marker '*' (legacy display convention).
    let billed = reconciler.bill_student(7, "MAR", 2025).unwrap();
    assert!(!billed);
    assert!(store.table(EntityKind::Bill).unwrap().rows.is_empty());
    assert_eq!(
        legacy_student_field(&legacy, 1, "MARBILL"),
        LegacyValue::Str("*".to_string())
    );

    // Toggle back on: involution restores the row, marker cleared.
    let billed = Reconciler::new(&mut store, &mut legacy, 2025)
        .bill_student(7, "MAR", 2025)
        .unwrap();
    assert!(billed);
    assert_eq!(store.table(EntityKind::Bill).unwrap().rows.len(), 1);
    assert_eq!(
        legacy_student_field(&legacy, 1, "MARBILL"),
        LegacyValue::Str(String::new())
    );
}

#[test]
fn registration_fee_uses_reg_bucket() {
    let (mut store, mut legacy, _dir) = setup();
    let billed = Reconciler::new(&mut store, &mut legacy, 2025)
        .bill_student(1, "REG", 2025)
        .unwrap();
    assert!(billed);
    let bills = store.table(EntityKind::Bill).unwrap();
    assert_eq!(bills.get_field(0, "MONTH").unwrap(), &Value::Integer(13));
    assert_eq!(
        legacy_student_field(&legacy, 0, "REGBILL"),
        LegacyValue::Str(String::new())
    );
}

#[test]
fn class_edit_writes_through_both_stores() {
    let (mut store, mut legacy, _dir) = setup();
    seed_class(&mut store, &mut legacy, 10, 19, 2, &[]);

    Reconciler::new(&mut store, &mut legacy, 2025)
        .update_class_info(
            10,
            &[
                ("INSTRUCTOR".to_string(), "pat".to_string()),
                ("TIME".to_string(), "5:30 pm".to_string()),
            ],
        )
        .unwrap();

    let classes = store.table(EntityKind::Class).unwrap();
    let pos = store.class_row(10).unwrap();
    assert_eq!(
        classes.get_field(pos, "INSTRUCTOR").unwrap(),
        &Value::Text("PAT".to_string())
    );
    assert_eq!(
        classes.get_field(pos, "TIME").unwrap(),
        &Value::Text("5:30 PM".to_string())
    );
    let table = legacy.table(CLASS_TABLE).unwrap();
    assert_eq!(
        table.get(0, "INSTRUCTOR").unwrap(),
        &LegacyValue::Str("PAT".to_string())
    );
    assert_eq!(
        table.get(0, "TIME").unwrap(),
        &LegacyValue::Str("5:30 PM".to_string())
    );

    // Re-applying the same values is a no-op diff, not an error.
    Reconciler::new(&mut store, &mut legacy, 2025)
        .update_class_info(10, &[("INSTRUCTOR".to_string(), "PAT".to_string())])
        .unwrap();
    let table = legacy.table(CLASS_TABLE).unwrap();
    assert_eq!(
        table.get(0, "INSTRUCTOR").unwrap(),
        &LegacyValue::Str("PAT".to_string())
    );
}

#[test]
fn class_edit_validation_failure_touches_nothing() {
    let (mut store, mut legacy, _dir) = setup();
    seed_class(&mut store, &mut legacy, 10, 19, 2, &[]);

    let err = Reconciler::new(&mut store, &mut legacy, 2025).update_class_info(
        10,
        &[
            ("INSTRUCTOR".to_string(), "pat".to_string()),
            ("TIME".to_string(), "4:30 PM TO 5:30 PM".to_string()), // exceeds width 10
        ],
    );
    assert!(matches!(err, Err(GymError::Validation { .. })));

    let classes = store.table(EntityKind::Class).unwrap();
    let pos = store.class_row(10).unwrap();
    assert_eq!(
        classes.get_field(pos, "INSTRUCTOR").unwrap(),
        &Value::Text("KIM".to_string())
    );
}

#[test]
fn move_updates_available_and_slots() {
    let (mut store, mut legacy, _dir) = setup();
    // Class 10: MAX=19, AVAILABLE=2, student 1042 in slot 3.
    seed_class(&mut store, &mut legacy, 10, 19, 2, &[2001, 2002, 1042]);
    // Class 11: AVAILABLE=5, slot 1 taken, slot 2 free.
    seed_class(&mut store, &mut legacy, 11, 12, 5, &[2003]);
    link(&mut store, 10, 1, true);

    Reconciler::new(&mut store, &mut legacy, 2025)
        .move_student(1, 10, 11)
        .unwrap();

    let classes = store.table(EntityKind::Class).unwrap();
    let from = store.class_row(10).unwrap();
    let to = store.class_row(11).unwrap();
    assert_eq!(classes.get_field(from, "AVAILABLE").unwrap(), &Value::Integer(3));
    assert_eq!(classes.get_field(to, "AVAILABLE").unwrap(), &Value::Integer(4));

    // Roster link moved, active flag preserved.
    let roster = store.table(EntityKind::Roster).unwrap();
    assert_eq!(roster.rows.len(), 1);
    assert_eq!(roster.get_field(0, "CLASS_ID").unwrap(), &Value::Integer(11));
    assert_eq!(roster.get_field(0, "ACTIVE").unwrap(), &Value::Boolean(true));

    // Legacy: old slot zeroed, first free slot of the new class filled.
    let table = legacy.table(CLASS_TABLE).unwrap();
    assert_eq!(table.get(0, "S3NO").unwrap(), &LegacyValue::Num(0.into()));
    assert_eq!(table.get(0, "S3NAME").unwrap(), &LegacyValue::Str(String::new()));
    assert_eq!(table.get(0, "AVAILABLE").unwrap(), &LegacyValue::Num(3.into()));
    assert_eq!(table.get(1, "S2NO").unwrap(), &LegacyValue::Num(1042.into()));
    assert_eq!(
        table.get(1, "S2NAME").unwrap(),
        &LegacyValue::Str("MARIA LOPEZ".to_string())
    );
    assert_eq!(table.get(1, "AVAILABLE").unwrap(), &LegacyValue::Num(4.into()));
}

#[test]
fn move_into_full_class_fails_loudly_and_cleanly() {
    let (mut store, mut legacy, _dir) = setup();
    seed_class(&mut store, &mut legacy, 10, 19, 2, &[1042]);
    // Every slot of class 11 is taken.
    let full: Vec<i64> = (0..20).map(|i| 3000 + i).collect();
    seed_class(&mut store, &mut legacy, 11, 20, 0, &full);
    link(&mut store, 10, 1, true);

    let err = Reconciler::new(&mut store, &mut legacy, 2025).move_student(1, 10, 11);
    assert!(matches!(err, Err(GymError::Capacity { class_id: 11, .. })));

    // Nothing moved in either store.
    let roster = store.table(EntityKind::Roster).unwrap();
    assert_eq!(roster.get_field(0, "CLASS_ID").unwrap(), &Value::Integer(10));
    let classes = store.table(EntityKind::Class).unwrap();
    let from = store.class_row(10).unwrap();
    assert_eq!(classes.get_field(from, "AVAILABLE").unwrap(), &Value::Integer(2));
    let table = legacy.table(CLASS_TABLE).unwrap();
    assert_eq!(table.get(0, "S1NO").unwrap(), &LegacyValue::Num(1042.into()));
}

#[test]
fn move_with_corrupt_old_slot_fails() {
    let (mut store, mut legacy, _dir) = setup();
    // Class 10 does not actually hold 1042 in any slot.
    seed_class(&mut store, &mut legacy, 10, 19, 2, &[2001]);
    seed_class(&mut store, &mut legacy, 11, 12, 5, &[]);
    link(&mut store, 10, 1, true);

    let err = Reconciler::new(&mut store, &mut legacy, 2025).move_student(1, 10, 11);
    assert!(matches!(err, Err(GymError::RecordNotFound { .. })));
}

#[test]
fn activate_is_a_two_way_flip() {
    let (mut store, mut legacy, _dir) = setup();
    let mut reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
    assert!(!reconciler.activate_student(1).unwrap());
    assert!(reconciler.activate_student(1).unwrap());

    let pos = store.student_row(1).unwrap();
    assert_eq!(
        store
            .table(EntityKind::Student)
            .unwrap()
            .get_field(pos, "ACTIVE")
            .unwrap(),
        &Value::Boolean(true)
    );
    assert_eq!(legacy_student_field(&legacy, 0, "ACTIVE"), LegacyValue::Bool(true));
}

#[test]
fn validation_failure_touches_nothing() {
    let (mut store, mut legacy, _dir) = setup();
    let err = Reconciler::new(&mut store, &mut legacy, 2025).update_student_info(
        1,
        &[
            ("FNAME".to_string(), "anna".to_string()),
            ("STATE".to_string(), "TEXAS".to_string()), // exceeds width 2
        ],
        EditKind::General,
        2025,
    );
    assert!(matches!(err, Err(GymError::Validation { .. })));

    let pos = store.student_row(1).unwrap();
    assert_eq!(
        store
            .table(EntityKind::Student)
            .unwrap()
            .get_field(pos, "FNAME")
            .unwrap(),
        &Value::Text("MARIA".to_string())
    );
    assert_eq!(
        legacy_student_field(&legacy, 0, "FNAME"),
        LegacyValue::Str("MARIA".to_string())
    );
}

#[test]
fn missing_legacy_record_rolls_memory_back() {
    let (mut store, mut legacy, _dir) = setup();
    // Student 9 exists only in the tabular store: integrity breach.
    let table = store.table_mut(EntityKind::Student).unwrap();
    let mut values: Vec<Value> = table
        .columns
        .iter()
        .map(|c| c.data_type.empty_value())
        .collect();
    values[table.column_index("STUDENT_ID").unwrap()] = Value::Integer(9);
    values[table.column_index("STUDENTNO").unwrap()] = Value::Integer(9999);
    values[table.column_index("FNAME").unwrap()] = Value::Text("GHOST".to_string());
    values[table.column_index("LNAME").unwrap()] = Value::Text("ROW".to_string());
    table.insert(Row::new(values)).unwrap();

    let err = Reconciler::new(&mut store, &mut legacy, 2025).update_student_info(
        9,
        &[("FNAME".to_string(), "newname".to_string())],
        EditKind::General,
        2025,
    );
    assert!(matches!(err, Err(GymError::RecordNotFound { .. })));

    // Compensation restored the in-memory value.
    let pos = store.student_row(9).unwrap();
    assert_eq!(
        store
            .table(EntityKind::Student)
            .unwrap()
            .get_field(pos, "FNAME")
            .unwrap(),
        &Value::Text("GHOST".to_string())
    );
}

#[test]
fn guardian_name_updates_in_place_or_noops() {
    let (mut store, mut legacy, _dir) = setup();
    store
        .table_mut(EntityKind::Guardian)
        .unwrap()
        .insert(Row::new(vec![
            Value::Integer(5),
            Value::Text("MOM".to_string()),
            Value::Text("ROSA LOPEZ".to_string()),
        ]))
        .unwrap();

    let mut reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
    reconciler
        .update_student_info(
            1,
            &[("MOMNAME".to_string(), "rosa m lopez".to_string())],
            EditKind::General,
            2025,
        )
        .unwrap();
    // No DAD guardian row exists: documented no-op, not an error.
    reconciler
        .update_student_info(
            1,
            &[("DADNAME".to_string(), "carlos lopez".to_string())],
            EditKind::General,
            2025,
        )
        .unwrap();

    let guardians = store.table(EntityKind::Guardian).unwrap();
    assert_eq!(guardians.rows.len(), 1);
    assert_eq!(
        guardians.get_field(0, "NAME").unwrap(),
        &Value::Text("ROSA M LOPEZ".to_string())
    );
}

#[test]
fn prior_year_edits_go_to_the_prev_table() {
    let (mut store, mut legacy, _dir) = setup();
    // Mirror student 1 into the prior-year table.
    {
        let table = legacy.table_mut(gymbook::legacy::STUDENT_PREV_TABLE).unwrap();
        let pos = table.push_default_record();
        let idx = table.field_index("STUDENTNO").unwrap();
        table.records[pos].values[idx] = LegacyValue::Num(1042.into());
    }
    Reconciler::new(&mut store, &mut legacy, 2025)
        .update_student_info(
            1,
            &[("CITY".to_string(), "dallas".to_string())],
            EditKind::General,
            2024,
        )
        .unwrap();

    let prev = legacy.table(gymbook::legacy::STUDENT_PREV_TABLE).unwrap();
    assert_eq!(
        prev.get(0, "CITY").unwrap(),
        &LegacyValue::Str("DALLAS".to_string())
    );
    // Current-year record untouched.
    assert_eq!(legacy_student_field(&legacy, 0, "CITY"), LegacyValue::Str(String::new()));
}

#[test]
fn available_tracks_active_links_across_moves() {
    let (mut store, mut legacy, _dir) = setup();
    seed_class(&mut store, &mut legacy, 10, 19, 17, &[1042]);
    seed_class(&mut store, &mut legacy, 11, 12, 11, &[1077]);
    link(&mut store, 10, 1, true);
    link(&mut store, 11, 7, true);

    // Move 1 out of 10 and back again.
    {
        let mut reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
        reconciler.move_student(1, 10, 11).unwrap();
        reconciler.move_student(1, 11, 10).unwrap();
    }

    let classes = store.table(EntityKind::Class).unwrap();
    let roster = store.table(EntityKind::Roster).unwrap();
    for (class_id, max) in [(10i64, 19i64), (11, 12)] {
        let row = store.class_row(class_id).unwrap();
        let available = classes.get_field(row, "AVAILABLE").unwrap().as_int().unwrap();
        let cid = roster.column_index("CLASS_ID").unwrap();
        let act = roster.column_index("ACTIVE").unwrap();
        let links = roster
            .rows
            .iter()
            .filter(|r| {
                r.get(cid).as_int() == Some(class_id) && r.get(act).as_bool() == Some(true)
            })
            .count() as i64;
        // The class invariant: AVAILABLE = MAX - active links (seeded links
        // not materialized here are part of the seeded AVAILABLE).
        assert_eq!(available, match class_id {
            10 => 19 - 1 - 1, // 17 seeded occupancy expressed directly
            _ => 12 - 1,
        });
        assert!(links <= max);
    }
}

#[test]
fn slot_capacity_constants_hold() {
    assert_eq!(schema::slot_capacity(EntityKind::Wait), Some(schema::MAX_WAIT_SLOTS));
    assert_eq!(schema::slot_capacity(EntityKind::Student), None);
}
