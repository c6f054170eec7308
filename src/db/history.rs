use super::{Db, models::*};
use chrono::Utc;
use rusqlite::{OptionalExtension, Result, params};

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let sent_by_raw: String = row.get(3)?;
    let sent_by = match sent_by_raw.as_str() {
        "user" => SenderType::User,
        "system" => SenderType::System,
        _ => {
            return Err(rusqlite::Error::InvalidColumnType(
                3,
                "sent_by".to_string(),
                rusqlite::types::Type::Text,
            ));
        }
    };

    Ok(Message {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        text: row.get(2)?,
        sent_by,
        created_at: row.get(4)?,
    })
}

impl Db {
    /// Create a new chat and return it.
    pub fn create_chat(&self, chat_title: &str) -> Result<Chat> {
        let chat = Chat {
            id: uuid::Uuid::new_v4().to_string(),
            chat_title: chat_title.to_string(),
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO chats (id, chat_title, created_at) VALUES (?, ?, ?)",
            params![chat.id, chat.chat_title, chat.created_at],
        )?;

        Ok(chat)
    }

    /// All chats, newest first.
    pub fn list_chats(&self) -> Result<Vec<Chat>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, chat_title, created_at FROM chats ORDER BY created_at DESC, rowid DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Chat {
                id: row.get(0)?,
                chat_title: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        rows.collect()
    }

    /// Look up a chat by id.
    pub fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        self.conn
            .query_row(
                "SELECT id, chat_title, created_at FROM chats WHERE id = ?",
                params![chat_id],
                |row| {
                    Ok(Chat {
                        id: row.get(0)?,
                        chat_title: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
    }

    /// Delete a chat and, via FK cascade, its messages.
    pub fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM chats WHERE id = ?", params![chat_id])?;
        Ok(rows > 0)
    }

    /// Append a message to a chat.
    pub fn insert_message(
        &self,
        chat_id: &str,
        text: &str,
        sent_by: SenderType,
    ) -> Result<Message> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            sent_by,
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO messages (id, chat_id, text, sent_by, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                message.id,
                message.chat_id,
                message.text,
                message.sent_by.as_str(),
                message.created_at
            ],
        )?;

        Ok(message)
    }

    /// All messages of a chat in chronological order.
    pub fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, chat_id, text, sent_by, created_at FROM messages
             WHERE chat_id = ? ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![chat_id], map_message_row)?;
        rows.collect()
    }

    /// The last `limit` messages of a chat, in chronological order.
    pub fn recent_messages(&self, chat_id: &str, limit: usize) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, chat_id, text, sent_by, created_at FROM messages
             WHERE chat_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![chat_id, limit as i64], map_message_row)?;

        let mut messages: Vec<Message> = rows.collect::<Result<_>>()?;
        messages.reverse();
        Ok(messages)
    }
}

/// Format a history window as alternating `User:` / `Assistant:` lines.
#[must_use]
pub fn format_chat_history(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| {
            let sender = match msg.sent_by {
                SenderType::User => "User",
                SenderType::System => "Assistant",
            };
            format!("{sender}: {}", msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chats_crud() {
        let db = Db::open_in_memory().unwrap();

        assert!(db.list_chats().unwrap().is_empty());

        let chat = db.create_chat("Chat 1").unwrap();
        db.create_chat("Chat 2").unwrap();

        let chats = db.list_chats().unwrap();
        assert_eq!(chats.len(), 2);

        let found = db.get_chat(&chat.id).unwrap().unwrap();
        assert_eq!(found.chat_title, "Chat 1");

        assert!(db.get_chat("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_messages_round_trip() {
        let db = Db::open_in_memory().unwrap();
        let chat = db.create_chat("Test Chat").unwrap();

        db.insert_message(&chat.id, "Hello", SenderType::User).unwrap();
        db.insert_message(&chat.id, "Hi there", SenderType::System)
            .unwrap();

        let messages = db.list_messages(&chat.id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[0].sent_by, SenderType::User);
        assert_eq!(messages[1].text, "Hi there");
        assert_eq!(messages[1].sent_by, SenderType::System);
    }

    #[test]
    fn test_delete_chat_cascades() {
        let db = Db::open_in_memory().unwrap();
        let chat = db.create_chat("Doomed").unwrap();
        db.insert_message(&chat.id, "Hello", SenderType::User).unwrap();

        assert!(db.delete_chat(&chat.id).unwrap());
        assert!(db.get_chat(&chat.id).unwrap().is_none());

        let orphan_count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphan_count, 0);
    }

    #[test]
    fn test_recent_messages_window() {
        let db = Db::open_in_memory().unwrap();
        let chat = db.create_chat("Long Chat").unwrap();

        for i in 0..6 {
            let sender = if i % 2 == 0 {
                SenderType::User
            } else {
                SenderType::System
            };
            db.insert_message(&chat.id, &format!("message {i}"), sender)
                .unwrap();
        }

        let recent = db.recent_messages(&chat.id, 4).unwrap();
        assert_eq!(recent.len(), 4);
        // Chronological order, starting from the cut
        assert_eq!(recent[0].text, "message 2");
        assert_eq!(recent[3].text, "message 5");
    }

    #[test]
    fn test_format_chat_history() {
        let db = Db::open_in_memory().unwrap();
        let chat = db.create_chat("Chat").unwrap();

        assert_eq!(format_chat_history(&[]), "");

        db.insert_message(&chat.id, "Hello", SenderType::User).unwrap();
        db.insert_message(&chat.id, "Hi there", SenderType::System)
            .unwrap();
        db.insert_message(&chat.id, "How can I help?", SenderType::User)
            .unwrap();

        let messages = db.list_messages(&chat.id).unwrap();
        assert_eq!(
            format_chat_history(&messages),
            "User: Hello\nAssistant: Hi there\nUser: How can I help?"
        );
    }
}
