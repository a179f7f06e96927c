use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

use crate::model::{OptionId, Question, QuestionId, QuestionType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerSheetError {
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),

    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    kind: QuestionType,
    options: HashSet<OptionId>,
    selected: BTreeSet<OptionId>,
}

/// Editable option selections for one attempt, one entry per quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerSheet {
    order: Vec<QuestionId>,
    slots: HashMap<QuestionId, Slot>,
}

impl AnswerSheet {
    /// Build a sheet from the quiz questions and any answers already saved.
    ///
    /// Saved answers for unknown questions are ignored, unknown option ids are dropped,
    /// and single-select questions keep at most one saved option.
    #[must_use]
    pub fn hydrate(
        questions: &[Question],
        saved: impl IntoIterator<Item = (QuestionId, Vec<OptionId>)>,
    ) -> Self {
        let mut order = Vec::with_capacity(questions.len());
        let mut slots = HashMap::with_capacity(questions.len());
        for question in questions {
            if slots.contains_key(&question.id) {
                continue;
            }
            order.push(question.id.clone());
            slots.insert(
                question.id.clone(),
                Slot {
                    kind: question.kind,
                    options: question.options.iter().map(|o| o.id.clone()).collect(),
                    selected: BTreeSet::new(),
                },
            );
        }

        for (question_id, option_ids) in saved {
            let Some(slot) = slots.get_mut(&question_id) else {
                continue;
            };
            let mut valid = option_ids
                .into_iter()
                .filter(|option| slot.options.contains(option));
            slot.selected = if slot.kind.is_single_select() {
                valid.next().into_iter().collect()
            } else {
                valid.collect()
            };
        }

        Self { order, slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn selection(&self, question_id: &QuestionId) -> Option<&BTreeSet<OptionId>> {
        self.slots.get(question_id).map(|slot| &slot.selected)
    }

    /// Number of questions with at least one selected option.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| !slot.selected.is_empty())
            .count()
    }

    /// Toggle an option following the question's selection rule.
    ///
    /// Single-select questions drop every other option before selecting this one;
    /// multi-select questions flip membership of this option only.
    ///
    /// # Errors
    ///
    /// Returns `AnswerSheetError` if the question or option is unknown.
    pub fn toggle_option(
        &mut self,
        question_id: &QuestionId,
        option_id: &OptionId,
    ) -> Result<(), AnswerSheetError> {
        let slot = self.slot_mut(question_id)?;
        if !slot.options.contains(option_id) {
            return Err(AnswerSheetError::UnknownOption {
                question: question_id.clone(),
                option: option_id.clone(),
            });
        }

        if slot.kind.is_single_select() {
            slot.selected.clear();
            slot.selected.insert(option_id.clone());
        } else if !slot.selected.remove(option_id) {
            slot.selected.insert(option_id.clone());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AnswerSheetError::UnknownQuestion` if the question is unknown.
    pub fn clear(&mut self, question_id: &QuestionId) -> Result<(), AnswerSheetError> {
        self.slot_mut(question_id)?.selected.clear();
        Ok(())
    }

    /// Every question's selection in quiz order, option ids sorted.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(QuestionId, Vec<OptionId>)> {
        self.order
            .iter()
            .filter_map(|id| {
                self.slots
                    .get(id)
                    .map(|slot| (id.clone(), slot.selected.iter().cloned().collect()))
            })
            .collect()
    }

    fn slot_mut(&mut self, question_id: &QuestionId) -> Result<&mut Slot, AnswerSheetError> {
        self.slots
            .get_mut(question_id)
            .ok_or_else(|| AnswerSheetError::UnknownQuestion(question_id.clone()))
    }
}
