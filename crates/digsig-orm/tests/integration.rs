use std::thread;

use digsig_db::{create_pool, open_in_memory, run_migrations, DbRuntimeSettings};
use digsig_orm::{
    count, delete, find, get, list, Address, CleaningDate, CleaningUser, Command, Customer,
    DamageReport, Deployment, Model, NewCleaningUser, NewDamageReport, ProxyHost, Statistics,
    TenantMessage,
};
use rusqlite::Connection;

fn setup() -> (Connection, Customer, Address, Deployment) {
    let conn = open_in_memory().expect("failed to open db");
    run_migrations(&conn).expect("failed to run migrations");
    let customer = Customer::add(&conn, "Hausverwaltung Nord").expect("customer");
    let address = Address::add(&conn, "Lindenallee", "12a", "24103", "Kiel").expect("address");
    let deployment = Deployment::add(&conn, customer.id, address.id).expect("deployment");
    (conn, customer, address, deployment)
}

fn assert_round_trip<M>(conn: &Connection, record: &M)
where
    M: Model + PartialEq + std::fmt::Debug,
{
    let stored: M = get(conn, record.id()).expect("record should be readable");
    assert_eq!(&stored, record, "{} did not round-trip", M::table());
}

#[test]
fn every_record_kind_round_trips() {
    let (conn, customer, address, deployment) = setup();

    let command = Command::add(&conn, customer.id, 3, "screenshot").unwrap();
    assert_round_trip(&conn, &command);

    let stats = Statistics::add(&conn, deployment.id, "welcome.html").unwrap();
    assert_round_trip(&conn, &stats);

    let user = CleaningUser::add(
        &conn,
        &NewCleaningUser {
            name: "Facility Team".to_string(),
            type_: Some("Hausmeister".to_string()),
            customer: customer.id,
            pin: "4711".to_string(),
            annotation: None,
            enabled: Some(true),
        },
    )
    .unwrap();
    assert_round_trip(&conn, &user);

    let cleaning =
        CleaningDate::add(&conn, user.id, address.id, Some(deployment.id), &["stairwell"]).unwrap();
    assert_round_trip(&conn, &cleaning);
    for annotation in cleaning.annotations(&conn).unwrap() {
        assert_round_trip(&conn, &annotation);
    }

    let message = TenantMessage::add(&conn, deployment.id, "Parcel for 2nd floor").unwrap();
    assert_round_trip(&conn, &message);

    let report = DamageReport::add(
        &conn,
        deployment.id,
        &NewDamageReport {
            message: "Mailbox lock broken".to_string(),
            name: "R. Schmidt".to_string(),
            damage_type: "mailbox".to_string(),
            contact: Some("0431 123456".to_string()),
        },
    )
    .unwrap();
    assert_round_trip(&conn, &report);

    let host = ProxyHost::add(&conn, "weather.example.org").unwrap();
    assert_round_trip(&conn, &host);
}

#[test]
fn deleted_records_are_not_found() {
    let (conn, customer, _, deployment) = setup();

    let command = Command::add(&conn, customer.id, 1, "reboot").unwrap();
    delete::<Command>(&conn, command.id).unwrap();
    let err = get::<Command>(&conn, command.id).unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err:?}");
    assert_eq!(find::<Command>(&conn, command.id).unwrap(), None);

    let message = TenantMessage::add(&conn, deployment.id, "hello").unwrap();
    delete::<TenantMessage>(&conn, message.id).unwrap();
    assert!(list::<TenantMessage>(&conn).unwrap().is_empty());

    let err = delete::<TenantMessage>(&conn, message.id).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn unknown_parents_are_rejected() {
    let (conn, customer, address, deployment) = setup();

    let err = Command::add(&conn, customer.id + 100, 1, "reboot").unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err:?}");

    let err = Statistics::add(&conn, deployment.id + 100, "x.pdf").unwrap_err();
    assert!(err.is_constraint_violation());

    let err = CleaningDate::add::<&str>(&conn, 999, address.id, None, &[]).unwrap_err();
    assert!(err.is_constraint_violation());

    assert_eq!(count::<Statistics>(&conn).unwrap(), 0);
    assert_eq!(count::<CleaningDate>(&conn).unwrap(), 0);
}

#[test]
fn deleting_a_deployment_cascades_to_its_records() {
    let (conn, _, _, deployment) = setup();

    Statistics::add(&conn, deployment.id, "a.pdf").unwrap();
    TenantMessage::add(&conn, deployment.id, "hello").unwrap();

    delete::<Deployment>(&conn, deployment.id).unwrap();
    assert_eq!(count::<Statistics>(&conn).unwrap(), 0);
    assert_eq!(count::<TenantMessage>(&conn).unwrap(), 0);
}

#[test]
fn concurrent_writers_on_a_shared_pool() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("digsig.db");
    let path = path.to_str().expect("temp path should be utf-8");

    let pool = create_pool(path, DbRuntimeSettings::default()).expect("failed to create pool");
    let deployment = {
        let conn = pool.get().expect("connection");
        run_migrations(&conn).expect("migrations");
        let customer = Customer::add(&conn, "Stadtwerke").unwrap();
        let address = Address::add(&conn, "Hafenstr.", "1", "28195", "Bremen").unwrap();
        Deployment::add(&conn, customer.id, address.id).unwrap().id
    };

    let handles: Vec<_> = (0..2)
        .map(|n| {
            let pool = pool.clone();
            thread::spawn(move || {
                let conn = pool.get().expect("connection");
                (0..10)
                    .map(|i| {
                        Statistics::add(&conn, deployment, &format!("doc-{n}-{i}.pdf"))
                            .expect("insert")
                            .id
                    })
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("writer thread panicked"))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    let conn = pool.get().expect("connection");
    assert_eq!(count::<Statistics>(&conn).unwrap(), 20);
}
