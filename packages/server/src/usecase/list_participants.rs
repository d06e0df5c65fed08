//! UseCase: 参加者一覧取得
//!
//! 呼び出した本人を先頭に、残りの参加者を ID 順で返します。

use std::sync::Arc;

use crate::domain::{Participant, ParticipantId, ParticipantRepository};

use super::{RelayTimeouts, bounded, error::ListParticipantsError};

/// 参加者一覧取得のユースケース
pub struct ListParticipantsUseCase {
    participants: Arc<dyn ParticipantRepository>,
    timeouts: RelayTimeouts,
}

impl ListParticipantsUseCase {
    pub fn new(participants: Arc<dyn ParticipantRepository>, timeouts: RelayTimeouts) -> Self {
        Self {
            participants,
            timeouts,
        }
    }

    pub async fn execute(
        &self,
        current: &ParticipantId,
    ) -> Result<Vec<Participant>, ListParticipantsError> {
        let mut participants =
            bounded(self.timeouts.store, self.participants.list_participants()).await?;

        let position = participants
            .iter()
            .position(|p| &p.id == current)
            .ok_or(ListParticipantsError::CurrentParticipantNotFound)?;
        let me = participants.remove(position);

        let mut ordered = Vec::with_capacity(participants.len() + 1);
        ordered.push(me);
        ordered.extend(participants);
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{fast_timeouts, pid, seeded_repository};

    #[tokio::test]
    async fn test_list_puts_current_participant_first() {
        // テスト項目: 本人が先頭で、残りは ID 順
        // given (前提条件):
        let repository = seeded_repository(&["carol", "alice", "bob"]).await;
        let usecase = ListParticipantsUseCase::new(repository, fast_timeouts());

        // when (操作):
        let participants = usecase.execute(&pid("bob")).await.unwrap();

        // then (期待する結果):
        let ids: Vec<&str> = participants.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["bob", "alice", "carol"]);
    }

    #[tokio::test]
    async fn test_list_reflects_online_flag() {
        // テスト項目: online フラグがそのまま返る
        // given (前提条件):
        let repository = seeded_repository(&["alice", "bob"]).await;
        repository.set_online(&pid("alice"), true).await.unwrap();
        let usecase = ListParticipantsUseCase::new(repository, fast_timeouts());

        // when (操作):
        let participants = usecase.execute(&pid("bob")).await.unwrap();

        // then (期待する結果):
        assert!(!participants[0].is_online);
        assert!(participants[1].is_online);
    }

    #[tokio::test]
    async fn test_list_unknown_current_participant() {
        // テスト項目: 本人がストアに存在しなければエラー
        // given (前提条件):
        let repository = seeded_repository(&["alice"]).await;
        let usecase = ListParticipantsUseCase::new(repository, fast_timeouts());

        // when (操作):
        let result = usecase.execute(&pid("ghost")).await;

        // then (期待する結果):
        assert_eq!(result, Err(ListParticipantsError::CurrentParticipantNotFound));
    }
}
