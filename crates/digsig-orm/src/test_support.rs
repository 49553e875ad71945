//! Shared fixtures for the unit tests.

use rusqlite::Connection;

use crate::parents::{Address, Customer, Deployment};

/// Creates an in-memory database with foreign keys enforced and migrations applied.
pub(crate) fn setup_db() -> Connection {
    let conn = digsig_db::open_in_memory().expect("failed to open in-memory db");
    digsig_db::run_migrations(&conn).expect("failed to run migrations");
    conn
}

/// One customer with one deployment at one address.
pub(crate) struct Site {
    pub customer: Customer,
    pub address: Address,
    pub deployment: Deployment,
}

pub(crate) fn seed_site(conn: &Connection) -> Site {
    let customer = Customer::add(conn, "Wohnbau GmbH").expect("failed to add customer");
    let address = Address::add(conn, "Am Markt", "3", "30159", "Hannover")
        .expect("failed to add address");
    let deployment =
        Deployment::add(conn, customer.id, address.id).expect("failed to add deployment");
    Site {
        customer,
        address,
        deployment,
    }
}
