use crate::models::{
    MessageRow, MessageWithSenderRow, NewMessage, NewUser, ReplyOutcome, SaleItemRow, UserRow,
};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, Row};
use storefront_types::models::{MediaKind, MessageStatus};

const USER_COLUMNS: &str = "id, username, password, email, first_name, last_name, display_name, \
     postcode, country, avatar_url, background_url, role, created_at";

const MESSAGE_COLUMNS: &str = "m.id, m.subject, m.content, m.from_user_id, m.to_user_id, \
     m.is_from_admin, m.status, m.created_at, m.updated_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, email, first_name, last_name,
                                    display_name, postcode, country, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.password_hash,
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.display_name,
                    user.postcode,
                    user.country,
                    user.role,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn set_user_role(&self, id: &str, role: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE users SET role = ?2 WHERE id = ?1", (id, role))?;
            Ok(changed > 0)
        })
    }

    pub fn set_user_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("UPDATE users SET password = ?2 WHERE id = ?1", (id, password_hash))?;
            Ok(changed > 0)
        })
    }

    /// Sets or clears (`None`) the URL for one profile image slot.
    /// Returns false when the user does not exist.
    pub fn set_media_url(&self, user_id: &str, kind: MediaKind, url: Option<&str>) -> Result<bool> {
        let sql = match kind {
            MediaKind::Avatar => "UPDATE users SET avatar_url = ?2 WHERE id = ?1",
            MediaKind::Background => "UPDATE users SET background_url = ?2 WHERE id = ?1",
        };
        self.with_conn(|conn| {
            let changed = conn.execute(sql, rusqlite::params![user_id, url])?;
            Ok(changed > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &NewMessage<'_>) -> Result<()> {
        let now = now_timestamp();
        self.with_conn(|conn| insert_message_row(conn, message, &now))
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1");
            conn.query_row(&sql, [id], |row| message_from_row(row)).optional()
        })
    }

    /// Messages the user sent or received, newest first.
    pub fn get_messages_for_user(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m
                 WHERE m.from_user_id = ?1 OR m.to_user_id = ?1
                 ORDER BY m.created_at DESC, m.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], |row| message_from_row(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every message, optionally restricted to one status, newest first,
    /// joined with the sender's identity.
    pub fn get_all_messages(&self, status: Option<MessageStatus>) -> Result<Vec<MessageWithSenderRow>> {
        let status = status.map(|s| s.as_str());
        self.with_conn(|conn| {
            // JOIN users to fetch the sender summary in a single query (no N+1)
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}, u.username, u.display_name
                 FROM messages m
                 LEFT JOIN users u ON m.from_user_id = u.id
                 WHERE ?1 IS NULL OR m.status = ?1
                 ORDER BY m.created_at DESC, m.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([status], |row| {
                    Ok(MessageWithSenderRow {
                        message: message_from_row(row)?,
                        sender_username: row
                            .get::<_, Option<String>>(9)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        sender_display_name: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no message has this id.
    pub fn update_message_status(&self, id: &str, status: MessageStatus) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET status = ?2, updated_at = ?3 WHERE id = ?1",
                (id, status.as_str(), now),
            )?;
            Ok(changed > 0)
        })
    }

    /// Marks the original REPLIED and inserts the reply, atomically.
    /// Nothing is written unless both the original and the recipient exist.
    pub fn reply_to_message(&self, original_id: &str, reply: &NewMessage<'_>) -> Result<ReplyOutcome> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let original_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1)",
                [original_id],
                |row| row.get(0),
            )?;
            if !original_exists {
                return Ok(ReplyOutcome::OriginalMissing);
            }

            if let Some(recipient) = reply.to_user_id {
                let recipient_exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                    [recipient],
                    |row| row.get(0),
                )?;
                if !recipient_exists {
                    return Ok(ReplyOutcome::RecipientMissing);
                }
            }

            tx.execute(
                "UPDATE messages SET status = ?2, updated_at = ?3 WHERE id = ?1",
                (original_id, MessageStatus::Replied.as_str(), &now),
            )?;
            insert_message_row(&tx, reply, &now)?;
            tx.commit()?;
            Ok(ReplyOutcome::Replied)
        })
    }

    pub fn count_messages(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?)
        })
    }

    // -- Sale items --

    pub fn insert_sale_item(&self, item: &SaleItemRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sale_items (id, name, original_price_cents, sale_price_cents,
                                         image_url, rating, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    item.id,
                    item.name,
                    item.original_price_cents,
                    item.sale_price_cents,
                    item.image_url,
                    item.rating,
                    item.created_by,
                    item.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_sale_items(&self) -> Result<Vec<SaleItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, original_price_cents, sale_price_cents, image_url, rating,
                        created_by, created_at
                 FROM sale_items
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SaleItemRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        original_price_cents: row.get(2)?,
                        sale_price_cents: row.get(3)?,
                        image_url: row.get(4)?,
                        rating: row.get(5)?,
                        created_by: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            email: row.get(3)?,
            first_name: row.get(4)?,
            last_name: row.get(5)?,
            display_name: row.get(6)?,
            postcode: row.get(7)?,
            country: row.get(8)?,
            avatar_url: row.get(9)?,
            background_url: row.get(10)?,
            role: row.get(11)?,
            created_at: row.get(12)?,
        })
    })
    .optional()
}

fn insert_message_row(conn: &Connection, message: &NewMessage<'_>, now: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, subject, content, from_user_id, to_user_id, is_from_admin,
                               status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        rusqlite::params![
            message.id,
            message.subject,
            message.content,
            message.from_user_id,
            message.to_user_id,
            message.is_from_admin,
            MessageStatus::Unread.as_str(),
            now,
        ],
    )?;
    Ok(())
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        subject: row.get(1)?,
        content: row.get(2)?,
        from_user_id: row.get(3)?,
        to_user_id: row.get(4)?,
        is_from_admin: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
