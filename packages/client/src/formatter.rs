//! Message formatting utilities for client display.

use chrono::{Local, TimeZone};
use denpo_server::infrastructure::dto::http::{MessageDto, ParticipantDto};
use denpo_shared::time::rfc3339_to_timestamp;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the participant list fetched after connecting
    ///
    /// # Arguments
    ///
    /// * `participants` - Participants as returned by `GET /api/users` (caller first)
    /// * `me` - The current participant's ID (to mark as "me")
    pub fn format_participants(participants: &[ParticipantDto], me: &str) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str("Participants:\n");

        if participants.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for participant in participants {
                let me_suffix = if participant.id == me { " (me)" } else { "" };
                let status = if participant.is_online {
                    "online"
                } else {
                    "offline"
                };
                output.push_str(&format!(
                    "{}{} [{}] {}\n",
                    participant.id, me_suffix, status, participant.name
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a presence change
    pub fn format_presence(participant_id: &str, online: bool) -> String {
        if online {
            format!("\n+ {} is online\n", participant_id)
        } else {
            format!("\n- {} is offline\n", participant_id)
        }
    }

    /// Format a direct message from the viewpoint of `me`
    ///
    /// # Arguments
    ///
    /// * `message` - The message record
    /// * `me` - The current participant's ID
    pub fn format_message(message: &MessageDto, me: &str) -> String {
        let header = if message.sender_id == me {
            format!("you -> @{}", message.recipient_id)
        } else {
            format!("@{}", message.sender_id)
        };
        let unread = if message.sender_id != me && !message.read {
            " (new)"
        } else {
            ""
        };
        format!(
            "\n------------------------------------------------------------\n\
             {}{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            header,
            unread,
            message.content,
            Self::format_timestamp(&message.created_at)
        )
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(message: &MessageDto) -> String {
        format!(
            "sent to @{} at {}\n",
            message.recipient_id,
            Self::format_timestamp(&message.created_at)
        )
    }

    /// Format a raw text frame that could not be parsed
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    /// RFC 3339 → local time; unparsable values are shown as they are
    fn format_timestamp(rfc3339: &str) -> String {
        rfc3339_to_timestamp(rfc3339)
            .and_then(|millis| Local.timestamp_millis_opt(millis).single())
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| rfc3339.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, online: bool) -> ParticipantDto {
        ParticipantDto {
            id: id.to_string(),
            name: id.to_uppercase(),
            email: format!("{}@example.com", id),
            is_online: online,
        }
    }

    fn message(from: &str, to: &str, read: bool) -> MessageDto {
        MessageDto {
            id: "m1".to_string(),
            sender_id: from.to_string(),
            recipient_id: to.to_string(),
            content: "Hello, world!".to_string(),
            created_at: "2023-01-01T12:00:00.000Z".to_string(),
            read,
        }
    }

    #[test]
    fn test_format_participants_with_empty_list() {
        // テスト項目: 参加者が空の場合、適切なメッセージが表示される
        // given (前提条件):
        let participants = vec![];

        // when (操作):
        let result = MessageFormatter::format_participants(&participants, "alice");

        // then (期待する結果):
        assert!(result.contains("Participants:"));
        assert!(result.contains("(No participants)"));
    }

    #[test]
    fn test_format_participants_marks_me_and_status() {
        // テスト項目: 自分にはマークが付き、online / offline が表示される
        // given (前提条件):
        let participants = vec![participant("alice", true), participant("bob", false)];

        // when (操作):
        let result = MessageFormatter::format_participants(&participants, "alice");

        // then (期待する結果):
        assert!(result.contains("alice (me) [online] ALICE"));
        assert!(result.contains("bob [offline] BOB"));
        assert!(!result.contains("bob (me)"));
    }

    #[test]
    fn test_format_presence() {
        // テスト項目: online / offline 通知が正しくフォーマットされる
        // given (前提条件):
        let participant_id = "bob";

        // when (操作):
        let online = MessageFormatter::format_presence(participant_id, true);
        let offline = MessageFormatter::format_presence(participant_id, false);

        // then (期待する結果):
        assert!(online.contains("+ bob is online"));
        assert!(offline.contains("- bob is offline"));
    }

    #[test]
    fn test_format_received_message() {
        // テスト項目: 受信メッセージは送信者と未読マーク付きで表示される
        // given (前提条件):
        let message = message("alice", "bob", false);

        // when (操作):
        let result = MessageFormatter::format_message(&message, "bob");

        // then (期待する結果):
        assert!(result.contains("@alice (new): Hello, world!"));
        assert!(result.contains("sent at 2023-01-0"));
    }

    #[test]
    fn test_format_own_message() {
        // テスト項目: 自分が送ったメッセージは宛先付きで表示され、未読マークは付かない
        // given (前提条件):
        let message = message("alice", "bob", false);

        // when (操作):
        let result = MessageFormatter::format_message(&message, "alice");

        // then (期待する結果):
        assert!(result.contains("you -> @bob: Hello, world!"));
        assert!(!result.contains("(new)"));
    }

    #[test]
    fn test_format_sent_confirmation() {
        // テスト項目: 送信確認メッセージが正しくフォーマットされる
        // given (前提条件):
        let message = message("alice", "bob", false);

        // when (操作):
        let result = MessageFormatter::format_sent_confirmation(&message);

        // then (期待する結果):
        assert!(result.contains("sent to @bob at"));
        assert!(result.contains("2023-01-0"));
    }

    #[test]
    fn test_unparsable_timestamp_is_shown_raw() {
        // テスト項目: 解析できない日時はそのまま表示される
        // given (前提条件):
        let mut message = message("alice", "bob", true);
        message.created_at = "yesterday".to_string();

        // when (操作):
        let result = MessageFormatter::format_message(&message, "bob");

        // then (期待する結果):
        assert!(result.contains("sent at yesterday"));
    }

    #[test]
    fn test_format_raw_message() {
        // テスト項目: 生メッセージが正しくフォーマットされる
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let result = MessageFormatter::format_raw_message(text);

        // then (期待する結果):
        assert!(result.contains("unknown message format"));
        assert!(result.contains("Received:"));
    }
}
