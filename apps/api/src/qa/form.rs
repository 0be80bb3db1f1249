use serde::Serialize;
use thiserror::Error;

/// `Idle → Submitting → {AnswerDisplayed | IdleWithError}`; every terminal
/// phase accepts a new submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormPhase {
    Idle,
    Submitting,
    AnswerDisplayed,
    IdleWithError,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("A question is already being answered")]
    Pending,
}

/// The question form of one session. At most one question is outstanding.
///
/// The last answer stays visible while a new question is pending and is only
/// replaced when the next answer arrives. A failure keeps it as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionForm {
    submitting: bool,
    answer: Option<String>,
    last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub phase: FormPhase,
    pub answer: Option<String>,
    pub error: Option<String>,
}

impl QuestionForm {
    pub fn phase(&self) -> FormPhase {
        if self.submitting {
            FormPhase::Submitting
        } else if self.last_error.is_some() {
            FormPhase::IdleWithError
        } else if self.answer.is_some() {
            FormPhase::AnswerDisplayed
        } else {
            FormPhase::Idle
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Starts a submission. Rejects blank questions and overlapping submissions.
    pub fn begin(&mut self, question: &str) -> Result<(), FormError> {
        if self.submitting {
            return Err(FormError::Pending);
        }
        if question.trim().is_empty() {
            return Err(FormError::EmptyQuestion);
        }
        self.submitting = true;
        Ok(())
    }

    pub fn complete(&mut self, answer: String) {
        self.submitting = false;
        self.answer = Some(answer);
        self.last_error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.last_error = Some(message.into());
    }

    /// Re-enables the form when a submission ends without an outcome.
    /// Returns whether one was pending.
    pub fn abandon(&mut self) -> bool {
        std::mem::take(&mut self.submitting)
    }

    /// Drops the displayed answer and error; a pending submission stays pending.
    pub fn reset(&mut self) {
        self.answer = None;
        self.last_error = None;
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            phase: self.phase(),
            answer: self.answer().map(str::to_string),
            error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut form = QuestionForm::default();
        assert_eq!(form.phase(), FormPhase::Idle);

        form.begin("Who knows Rust?").unwrap();
        assert_eq!(form.phase(), FormPhase::Submitting);

        form.complete("Nobody.".to_string());
        assert_eq!(form.phase(), FormPhase::AnswerDisplayed);
        assert_eq!(form.answer(), Some("Nobody."));
    }

    #[test]
    fn test_blank_question_rejected_without_state_change() {
        let mut form = QuestionForm::default();
        assert_eq!(form.begin("   \t"), Err(FormError::EmptyQuestion));
        assert_eq!(form.phase(), FormPhase::Idle);
    }

    #[test]
    fn test_second_submission_while_pending_is_rejected() {
        let mut form = QuestionForm::default();
        form.begin("first").unwrap();
        assert_eq!(form.begin("second"), Err(FormError::Pending));
        assert!(form.is_submitting());
    }

    #[test]
    fn test_previous_answer_survives_new_submission_and_failure() {
        let mut form = QuestionForm::default();
        form.begin("q1").unwrap();
        form.complete("a1".to_string());

        form.begin("q2").unwrap();
        assert_eq!(form.answer(), Some("a1"));

        form.fail("boom");
        assert_eq!(form.phase(), FormPhase::IdleWithError);
        assert_eq!(form.answer(), Some("a1"));

        form.begin("q3").unwrap();
        form.complete("a3".to_string());
        assert_eq!(form.phase(), FormPhase::AnswerDisplayed);
        assert_eq!(form.snapshot().error, None);
    }

    #[test]
    fn test_abandon_reenables() {
        let mut form = QuestionForm::default();
        form.begin("q").unwrap();
        assert!(form.abandon());
        assert!(!form.abandon());
        assert_eq!(form.phase(), FormPhase::Idle);
    }
}
