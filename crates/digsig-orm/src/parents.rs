//! Parent records referenced by the signage tables.
//!
//! Customers, addresses and deployments are owned by other services in the
//! wider signage system. Only the columns the signage records need are
//! declared here, so that foreign keys can be enforced locally.

use chrono::{DateTime, Utc};
use digsig_types::EntityKind;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::model::{get, insert_returning, Model};

/// A tenant/customer organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

impl Model for Customer {
    const KIND: EntityKind = EntityKind::Customer;
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Customer {
    /// Creates a customer.
    pub fn add(conn: &Connection, name: &str) -> Result<Self, OrmError> {
        insert_returning(conn, "INSERT INTO customer (name) VALUES (?1)", [name])
    }
}

/// A site address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub street: String,
    pub house_number: String,
    pub zip_code: String,
    pub city: String,
}

impl Model for Address {
    const KIND: EntityKind = EntityKind::Address;
    const COLUMNS: &'static [&'static str] = &["id", "street", "house_number", "zip_code", "city"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            street: row.get(1)?,
            house_number: row.get(2)?,
            zip_code: row.get(3)?,
            city: row.get(4)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Address {
    /// Creates an address.
    pub fn add(
        conn: &Connection,
        street: &str,
        house_number: &str,
        zip_code: &str,
        city: &str,
    ) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO address (street, house_number, zip_code, city) VALUES (?1, ?2, ?3, ?4)",
            params![street, house_number, zip_code, city],
        )
    }

    /// JSON form without the primary key, as nested into other records.
    pub fn to_json_without_id(&self) -> serde_json::Value {
        serde_json::json!({
            "street": self.street,
            "house_number": self.house_number,
            "zip_code": self.zip_code,
            "city": self.city,
        })
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}, {} {}",
            self.street, self.house_number, self.zip_code, self.city
        )
    }
}

/// An installed signage device (terminal) at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub customer: i64,
    pub address: i64,
    pub created: DateTime<Utc>,
}

impl Model for Deployment {
    const KIND: EntityKind = EntityKind::Deployment;
    const COLUMNS: &'static [&'static str] = &["id", "customer", "address", "created"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer: row.get(1)?,
            address: row.get(2)?,
            created: row.get(3)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Deployment {
    /// Creates a deployment of a device for `customer` at `address`.
    pub fn add(conn: &Connection, customer: i64, address: i64) -> Result<Self, OrmError> {
        insert_returning(
            conn,
            "INSERT INTO deployment (customer, address, created) VALUES (?1, ?2, ?3)",
            params![customer, address, Utc::now()],
        )
    }

    /// Loads the address the device is installed at.
    pub fn address(&self, conn: &Connection) -> Result<Address, OrmError> {
        get(conn, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{delete, list};
    use crate::test_support::setup_db;

    #[test]
    fn address_renders_postal_form() {
        let address = Address {
            id: 1,
            street: "Burgstraße".to_string(),
            house_number: "12a".to_string(),
            zip_code: "30159".to_string(),
            city: "Hannover".to_string(),
        };
        assert_eq!(address.to_string(), "Burgstraße 12a, 30159 Hannover");
        assert!(address.to_json_without_id().get("id").is_none());
    }

    #[test]
    fn deployment_requires_existing_customer() {
        let conn = setup_db();
        let address = Address::add(&conn, "Main St", "1", "12345", "Springfield").unwrap();

        let err = Deployment::add(&conn, 999, address.id).unwrap_err();
        assert!(err.is_constraint_violation(), "unexpected error: {err:?}");
    }

    #[test]
    fn deleting_customer_cascades_to_deployments() {
        let conn = setup_db();
        let customer = Customer::add(&conn, "ACME").unwrap();
        let address = Address::add(&conn, "Main St", "1", "12345", "Springfield").unwrap();
        Deployment::add(&conn, customer.id, address.id).unwrap();

        delete::<Customer>(&conn, customer.id).unwrap();
        assert!(list::<Deployment>(&conn).unwrap().is_empty());
    }

    #[test]
    fn deployment_loads_its_address() {
        let conn = setup_db();
        let customer = Customer::add(&conn, "ACME").unwrap();
        let address = Address::add(&conn, "Main St", "1", "12345", "Springfield").unwrap();
        let deployment = Deployment::add(&conn, customer.id, address.id).unwrap();

        assert_eq!(deployment.address(&conn).unwrap(), address);
    }
}
