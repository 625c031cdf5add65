//! First-run onboarding: name, interest categories, reading time.
//!
//! [`OnboardingFlow`] is a plain state machine; nothing is persisted until
//! [`OnboardingFlow::complete`] writes every answer in one transaction.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::content::Category;
use crate::preferences::{PreferenceState, ReadingTime};

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("a display name is required")]
    MissingName,

    #[error("select at least one category")]
    NoCategories,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Steps in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OnboardingStep {
    Name,
    Categories,
    ReadingTime,
}

impl OnboardingStep {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            OnboardingStep::Name => 0,
            OnboardingStep::Categories => 1,
            OnboardingStep::ReadingTime => 2,
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => OnboardingStep::Name,
            1 => OnboardingStep::Categories,
            _ => OnboardingStep::ReadingTime,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            OnboardingStep::Name => "What should we call you?",
            OnboardingStep::Categories => "Pick your interests",
            OnboardingStep::ReadingTime => "When do you usually read?",
        }
    }
}

/// Answers collected so far plus the current step.
#[derive(Debug, Clone, Default)]
pub struct OnboardingFlow {
    step: usize,
    name: String,
    categories: BTreeSet<Category>,
    reading_time: ReadingTime,
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flow pre-filled with every answer, advanced step by step as far as
    /// the answers allow. Repeated categories count once.
    pub fn from_answers(
        name: impl Into<String>,
        categories: impl IntoIterator<Item = Category>,
        reading_time: ReadingTime,
    ) -> Self {
        let mut flow = Self::new();
        flow.set_name(name);
        if flow.can_proceed() {
            flow.next();
        }
        flow.categories = categories.into_iter().collect();
        if flow.can_proceed() {
            flow.next();
        }
        flow.set_reading_time(reading_time);
        flow
    }

    pub fn step(&self) -> OnboardingStep {
        OnboardingStep::from_index(self.step)
    }

    /// Fraction of the flow before the current step, in `[0, 1)`.
    pub fn progress(&self) -> f32 {
        self.step as f32 / OnboardingStep::COUNT as f32
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    /// Returns whether `category` is selected afterwards.
    pub fn toggle_category(&mut self, category: Category) -> bool {
        if self.categories.remove(&category) {
            false
        } else {
            self.categories.insert(category);
            true
        }
    }

    pub fn reading_time(&self) -> ReadingTime {
        self.reading_time
    }

    pub fn set_reading_time(&mut self, reading_time: ReadingTime) {
        self.reading_time = reading_time;
    }

    /// Whether the current step's answer is sufficient to move on.
    pub fn can_proceed(&self) -> bool {
        self.check(self.step()).is_ok()
    }

    fn check(&self, step: OnboardingStep) -> Result<(), OnboardingError> {
        match step {
            OnboardingStep::Name if self.name.trim().is_empty() => {
                Err(OnboardingError::MissingName)
            }
            OnboardingStep::Categories if self.categories.is_empty() => {
                Err(OnboardingError::NoCategories)
            }
            _ => Ok(()),
        }
    }

    /// Advance one step. Stays on the last step. Does not validate; callers
    /// gate on [`can_proceed`](Self::can_proceed).
    pub fn next(&mut self) {
        self.step = (self.step + 1).min(OnboardingStep::COUNT - 1);
    }

    pub fn previous(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    /// Persist all answers and set the onboarding flag.
    ///
    /// Refuses unless a name and at least one category are present, which
    /// covers whichever step is current. The stored name is trimmed.
    pub async fn complete(&self, preferences: &PreferenceState) -> Result<(), OnboardingError> {
        self.check(OnboardingStep::Name)?;
        self.check(OnboardingStep::Categories)?;

        preferences
            .complete_onboarding(self.name.trim(), self.categories.clone(), self.reading_time)
            .await?;
        Ok(())
    }
}
