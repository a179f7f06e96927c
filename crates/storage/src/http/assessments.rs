use rollcall_core::model::{Attempt, AttemptId, AttemptResult, Question, QuizId};

use super::HttpRemote;
use super::wire::{AnswerDto, AttemptDto, AttemptResultDto, QuestionDto, SaveAnswersDto};
use crate::repository::{AnswerRecord, AssessmentRepository, StorageError};

#[async_trait::async_trait]
impl AssessmentRepository for HttpRemote {
    async fn get_attempt(&self, attempt_id: &AttemptId) -> Result<Attempt, StorageError> {
        let path = ["assessments", "attempts", attempt_id.as_str()];
        let attempt: AttemptDto = self.get_json(&path, &[]).await?;
        Ok(attempt.into())
    }

    async fn list_questions(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StorageError> {
        let path = ["assessments", "quizzes", quiz_id.as_str(), "questions"];
        let questions: Vec<QuestionDto> = self.get_json(&path, &[]).await?;
        Ok(questions.into_iter().map(Question::from).collect())
    }

    async fn list_answers(&self, attempt_id: &AttemptId) -> Result<Vec<AnswerRecord>, StorageError> {
        let path = ["assessments", "attempts", attempt_id.as_str(), "answers"];
        let answers: Vec<AnswerDto> = self.get_json(&path, &[]).await?;
        Ok(answers.into_iter().map(AnswerRecord::from).collect())
    }

    async fn save_answers(
        &self,
        attempt_id: &AttemptId,
        answers: &[AnswerRecord],
    ) -> Result<(), StorageError> {
        let path = ["assessments", "attempts", attempt_id.as_str(), "answers"];
        let body = SaveAnswersDto {
            answers: answers.iter().map(AnswerDto::from).collect(),
        };
        self.post_ack(&path, Some(&body)).await
    }

    async fn submit_attempt(&self, attempt_id: &AttemptId) -> Result<AttemptResult, StorageError> {
        let path = ["assessments", "attempts", attempt_id.as_str(), "submit"];
        let result: AttemptResultDto = self.post_json::<(), _>(&path, None).await?;
        Ok(result.into())
    }
}
