use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, messages)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                email           TEXT NOT NULL,
                first_name      TEXT NOT NULL DEFAULT '',
                last_name       TEXT NOT NULL DEFAULT '',
                display_name    TEXT NOT NULL DEFAULT '',
                postcode        TEXT NOT NULL DEFAULT '',
                country         TEXT NOT NULL DEFAULT '',
                avatar_url      TEXT,
                background_url  TEXT,
                role            TEXT NOT NULL DEFAULT 'CUSTOMER',
                created_at      TEXT NOT NULL
            );

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                subject         TEXT NOT NULL,
                content         TEXT NOT NULL,
                from_user_id    TEXT NOT NULL REFERENCES users(id),
                to_user_id      TEXT REFERENCES users(id),
                is_from_admin   INTEGER NOT NULL DEFAULT 0,
                status          TEXT NOT NULL DEFAULT 'UNREAD'
                                CHECK (status IN ('UNREAD', 'READ', 'REPLIED')),
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_messages_from ON messages(from_user_id, created_at);
            CREATE INDEX idx_messages_to ON messages(to_user_id, created_at);
            CREATE INDEX idx_messages_status ON messages(status, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (sale items)");
        conn.execute_batch(
            "
            CREATE TABLE sale_items (
                id                      TEXT PRIMARY KEY,
                name                    TEXT NOT NULL,
                original_price_cents    INTEGER NOT NULL CHECK (original_price_cents >= 0),
                sale_price_cents        INTEGER NOT NULL CHECK (sale_price_cents >= 0),
                image_url               TEXT NOT NULL,
                rating                  INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                created_by              TEXT NOT NULL REFERENCES users(id),
                created_at              TEXT NOT NULL
            );

            CREATE INDEX idx_sale_items_created ON sale_items(created_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
