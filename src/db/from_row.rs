//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{License, Provenance};

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// Bad values (hand-edited rows, old imports) become a typed error instead of a panic.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const LICENSE_COLS: &str = "licencia, status, hash_tienda, ultima_verificacion, fecha_creacion, numero_de_tiendas, license_number, order_number, customer_email, customer_name, order_total, currency";

// ============ FromRow Implementations ============

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // Unbound rows store an empty string, not NULL
        let hash: String = row.get(2)?;
        Ok(License {
            key: row.get(0)?,
            status: parse_enum(row, 1, "status")?,
            bound_fingerprint: Some(hash).filter(|h| !h.is_empty()),
            last_checked_at: row.get(3)?,
            created_at: row.get(4)?,
            usage_count: row.get(5)?,
            license_number: row.get(6)?,
            provenance: Provenance {
                order_reference: row.get(7)?,
                customer_email: row.get(8)?,
                customer_name: row.get(9)?,
                order_total: row.get(10)?,
                currency: row.get(11)?,
            },
        })
    }
}
