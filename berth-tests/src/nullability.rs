use crate::recreate_table;
use berth::{Connection, Entity, TypeMappingError};
use indoc::indoc;
use rust_decimal::Decimal;
use std::{
    str::FromStr,
    sync::{LazyLock, Mutex},
};
use time::{Date, Month, PrimitiveDateTime, Time};
use uuid::Uuid;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[berth(name = "sample")]
struct Sample {
    id: Option<i64>,
    flag: Option<bool>,
    tiny: Option<u8>,
    small: Option<i16>,
    big: Option<i64>,
    ratio: Option<f64>,
    amount: Option<Decimal>,
    label: Option<String>,
    payload: Option<Box<[u8]>>,
    day: Option<Date>,
    moment: Option<Time>,
    stamp: Option<PrimitiveDateTime>,
    token: Option<Uuid>,
}

/// Same table, with non-nullable fields.
#[derive(Entity, Default, Debug, PartialEq)]
#[berth(name = "sample")]
struct StrictSample {
    id: i64,
    flag: bool,
    tiny: u8,
    small: i16,
    big: i64,
    ratio: f64,
    amount: Decimal,
    label: String,
    payload: Box<[u8]>,
    token: Uuid,
}

#[derive(Entity, Debug)]
#[berth(name = "sample")]
struct StrictDay {
    id: i64,
    day: Date,
}

impl Default for StrictDay {
    fn default() -> Self {
        Self {
            id: 0,
            day: Date::MIN,
        }
    }
}

fn setup<C: Connection>(connection: &mut C) {
    recreate_table(
        connection,
        "sample",
        indoc! {"
            CREATE TABLE sample (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                flag INTEGER,
                tiny INTEGER,
                small INTEGER,
                big INTEGER,
                ratio REAL,
                amount TEXT,
                label TEXT,
                payload BLOB,
                day TEXT,
                moment TEXT,
                stamp TEXT,
                token TEXT
            )
        "},
        indoc! {"
            CREATE TABLE sample (
                id BIGSERIAL PRIMARY KEY,
                flag BOOLEAN,
                tiny SMALLINT,
                small SMALLINT,
                big BIGINT,
                ratio DOUBLE PRECISION,
                amount NUMERIC,
                label TEXT,
                payload BYTEA,
                day DATE,
                moment TIME,
                stamp TIMESTAMP,
                token UUID
            )
        "},
    );
}

pub fn nullability<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().unwrap();
    setup(connection);

    // Every field null
    let empty = Sample::default()
        .insert(connection)
        .expect("Failed to insert the null sample")
        .expect("The store did not return the generated key of the null sample");
    let key = empty.id.expect("The generated key was not written into the entity");
    let found = Sample::find(connection, key)
        .expect("Failed to query the null sample")
        .expect("Failed to find the null sample");
    assert_eq!(found, Sample { id: Some(key), ..Default::default() });

    // Every field set
    let full = Sample {
        id: None,
        flag: Some(true),
        tiny: Some(255),
        small: Some(-2),
        big: Some(9876543210),
        ratio: Some(0.5),
        amount: Some(Decimal::from_str("1234.56").unwrap()),
        label: Some("Hello world!".into()),
        payload: Some([0u8, 1, 2, 254, 255].into()),
        day: Some(Date::from_calendar_date(2024, Month::February, 29).unwrap()),
        moment: Some(Time::from_hms(12, 0, 10).unwrap()),
        stamp: Some(PrimitiveDateTime::new(
            Date::from_calendar_date(2025, Month::January, 16).unwrap(),
            Time::from_hms_milli(10, 15, 30, 250).unwrap(),
        )),
        token: Some(Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap()),
    }
    .insert(connection)
    .expect("Failed to insert the full sample")
    .expect("The store did not return the generated key of the full sample");
    let found = Sample::find(connection, full.id.unwrap())
        .expect("Failed to query the full sample")
        .expect("Failed to find the full sample");
    assert_eq!(found, full);

    // Back to null
    let cleared = Sample {
        id: full.id,
        ..Default::default()
    };
    cleared
        .update(connection)
        .expect("Failed to clear the full sample");
    assert_eq!(
        Sample::find(connection, full.id.unwrap()).expect("Failed to query the cleared sample"),
        Some(cleared)
    );
}

pub fn absent_values<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().unwrap();
    setup(connection);

    // Non-nullable primitive key, generated by the store
    let strict = StrictSample {
        id: 0,
        flag: true,
        tiny: 3,
        label: "strict".into(),
        token: Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap(),
        ..Default::default()
    }
    .insert(connection)
    .expect("Failed to insert the strict sample")
    .expect("The store did not return the generated key of the strict sample");
    assert_ne!(strict.id, 0);
    assert_eq!(
        StrictSample::find(connection, strict.id).expect("Failed to query the strict sample"),
        Some(strict)
    );

    // Null columns read into non-nullable fields
    let empty = Sample::default()
        .insert(connection)
        .expect("Failed to insert the null sample")
        .expect("The store did not return the generated key of the null sample");
    let key = empty.id.unwrap();
    let found = StrictSample::find(connection, key)
        .expect("Failed to query the null sample as strict")
        .expect("Failed to find the null sample as strict");
    assert_eq!(
        found,
        StrictSample {
            id: key,
            flag: false,
            tiny: 0,
            small: 0,
            big: 0,
            ratio: 0.0,
            amount: Decimal::ZERO,
            label: String::new(),
            payload: Box::default(),
            token: Uuid::nil(),
        }
    );

    // Temporal types have no absent value
    let error = StrictDay::find(connection, key)
        .expect_err("Reading a null date into a non-nullable field must fail");
    let error = error
        .downcast_ref::<TypeMappingError>()
        .expect("The error must be a TypeMappingError");
    assert_eq!(error.field, "day");
}
