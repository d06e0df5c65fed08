//! Client-side policies.
//!
//! This module contains pure functions without side effects, making them easy to test.

use crate::error::ClientError;

/// Maximum number of consecutive reconnection attempts
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Fixed delay between reconnection attempts
pub const RECONNECT_INTERVAL_MS: u64 = 1000;

/// A message typed by the user: `@<recipientId> <text>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient_id: String,
    pub content: String,
}

/// Check if the client should exit immediately based on the error type.
///
/// # Returns
///
/// `true` if retrying cannot help (the token was rejected, or another session
/// of the same participant took over), `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::Unauthorized(_) | ClientError::Replaced)
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

/// Parse an input line of the form `@<recipientId> <text>`.
pub fn parse_input(line: &str) -> Result<OutgoingMessage, ClientError> {
    let rest = line
        .trim()
        .strip_prefix('@')
        .ok_or_else(|| ClientError::InvalidInput("use '@<recipient> <message>'".to_string()))?;

    let (recipient_id, content) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| ClientError::InvalidInput("message must not be empty".to_string()))?;
    let content = content.trim();

    if recipient_id.is_empty() {
        return Err(ClientError::InvalidInput(
            "recipient must not be empty".to_string(),
        ));
    }
    if content.is_empty() {
        return Err(ClientError::InvalidInput(
            "message must not be empty".to_string(),
        ));
    }

    Ok(OutgoingMessage {
        recipient_id: recipient_id.to_string(),
        content: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_immediately_when_unauthorized() {
        // テスト項目: 認証エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::Unauthorized("Authentication error: Token expired".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_when_replaced() {
        // テスト項目: 別セッションに置き換えられた場合も再接続しない
        // given (前提条件):
        let error = ClientError::Replaced;

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, MAX_RECONNECT_ATTEMPTS);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_on_connection_error() {
        // テスト項目: 接続エラーで試行回数が残っていれば再接続する
        // given (前提条件):
        let error = ClientError::ConnectionError("refused".to_string());

        // when (操作):
        let first = should_attempt_reconnect(&error, 0, MAX_RECONNECT_ATTEMPTS);
        let last = should_attempt_reconnect(&error, 4, MAX_RECONNECT_ATTEMPTS);
        let exhausted = should_attempt_reconnect(&error, 5, MAX_RECONNECT_ATTEMPTS);

        // then (期待する結果):
        assert!(first);
        assert!(last);
        assert!(!exhausted);
    }

    #[test]
    fn test_parse_input_success() {
        // テスト項目: "@bob hello there" が受信者と本文に分解される
        // given (前提条件):
        let line = "  @bob hello there ";

        // when (操作):
        let result = parse_input(line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            OutgoingMessage {
                recipient_id: "bob".to_string(),
                content: "hello there".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_input_rejects_malformed_lines() {
        // テスト項目: 宛先なし・本文なし・空の宛先はエラー
        // given (前提条件):
        let lines = ["hello", "@bob", "@bob    ", "@ hello"];

        for line in lines {
            // when (操作):
            let result = parse_input(line);

            // then (期待する結果):
            assert!(
                matches!(result, Err(ClientError::InvalidInput(_))),
                "{:?} should be rejected",
                line
            );
        }
    }
}
