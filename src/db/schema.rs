use rusqlite::Connection;

/// Initialize the license ledger schema.
///
/// Column names follow the spreadsheet the ledger was first kept in, so exports
/// line up with the historical sheet.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- One row per issued license key. Rows are never deleted.
        -- hash_tienda = '' means unbound.
        CREATE TABLE IF NOT EXISTS licencias (
            licencia TEXT PRIMARY KEY,
            status TEXT NOT NULL CHECK (status IN ('nueva', 'activa', 'invalida', 'inválida')),
            hash_tienda TEXT NOT NULL DEFAULT '',
            ultima_verificacion TEXT NOT NULL,
            fecha_creacion TEXT NOT NULL,
            numero_de_tiendas INTEGER NOT NULL DEFAULT 0,
            license_number TEXT,
            order_number TEXT NOT NULL DEFAULT '',
            customer_email TEXT NOT NULL DEFAULT '',
            customer_name TEXT NOT NULL DEFAULT '',
            order_total TEXT NOT NULL DEFAULT '',
            currency TEXT NOT NULL DEFAULT 'EUR'
        );
        CREATE INDEX IF NOT EXISTS idx_licencias_order ON licencias(order_number);
        CREATE INDEX IF NOT EXISTS idx_licencias_hash ON licencias(hash_tienda) WHERE hash_tienda != '';
        "#,
    )
}
