use rusqlite::{Connection, TransactionBehavior, params};

use crate::error::Result;
use crate::models::License;

use super::from_row::{LICENSE_COLS, query_all, query_one};

// ============ Licenses ============

pub fn create_license(conn: &Connection, license: &License) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO licencias ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            LICENSE_COLS
        ),
        params![
            &license.key,
            license.status.as_ref(),
            license.bound_fingerprint.as_deref().unwrap_or(""),
            license.last_checked_at,
            license.created_at,
            license.usage_count,
            &license.license_number,
            &license.provenance.order_reference,
            &license.provenance.customer_email,
            &license.provenance.customer_name,
            &license.provenance.order_total,
            &license.provenance.currency,
        ],
    )?;
    Ok(())
}

/// Insert a batch of licenses in one transaction.
///
/// IMMEDIATE takes the write lock up front so the batch can't interleave with
/// another writer. Any failed insert rolls the whole batch back.
pub fn create_licenses(conn: &mut Connection, licenses: &[License]) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for license in licenses {
        create_license(&tx, license)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_license_by_key(conn: &Connection, key: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licencias WHERE licencia = ?1", LICENSE_COLS),
        &[&key],
    )
}

/// All licenses in insertion order.
pub fn list_licenses(conn: &Connection) -> Result<Vec<License>> {
    query_all(
        conn,
        &format!("SELECT {} FROM licencias ORDER BY rowid", LICENSE_COLS),
        &[],
    )
}

/// Overwrite the mutable columns of a license. Provenance is left untouched.
///
/// Plain last-writer-wins: there is no version check, so two concurrent
/// read-modify-write cycles on the same key can interleave.
/// Returns false if no row has this key.
pub fn update_license_state(conn: &Connection, license: &License) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE licencias
         SET status = ?2, hash_tienda = ?3, ultima_verificacion = ?4, numero_de_tiendas = ?5
         WHERE licencia = ?1",
        params![
            &license.key,
            license.status.as_ref(),
            license.bound_fingerprint.as_deref().unwrap_or(""),
            license.last_checked_at,
            license.usage_count,
        ],
    )?;
    Ok(updated > 0)
}

pub fn count_licenses(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM licencias", [], |row| row.get(0))?;
    Ok(count)
}
