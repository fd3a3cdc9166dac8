//! Typed commands extracted from action requests
//!
//! Each action declares which `data-*` parameters it reads. Extraction either
//! produces a fully-typed [`LearningCommand`] or a [`ParamError`]; a branch
//! never calls a collaborator with half-parsed input.

use std::str::FromStr;

use ui_dispatch::{ActionRequest, Marker};

use crate::names::{AllowedFunction, LearningAction};

/// Lowest and highest accepted joke rating
pub const RATING_RANGE: (u8, u8) = (1, 5);

/// Longest single activity log entry, in minutes
pub const MAX_ACTIVITY_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("{action} needs parameter {param:?}")]
    Missing {
        action: &'static str,
        param: &'static str,
    },
    #[error("parameter {param:?} is not a number: {value:?}")]
    NotANumber { param: &'static str, value: String },
    #[error("parameter {param:?} must be between {min} and {max}, got {value}")]
    OutOfRange {
        param: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("function {0:?} is not on the allow-list")]
    DisallowedFunction(String),
}

/// What an action asks the application to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningCommand {
    PageReload,
    DismissById { target_id: String },
    ModuleModalShow { module_id: String },
    ModuleModalClose,
    ShowDetails { id: String },
    JokeNext,
    JokeReveal,
    JokeRate { rating: u8 },
    QuizStart { quiz_id: String },
    QuizAnswer { question: usize, option: usize },
    QuizRestart,
    PlacementOpen,
    PlacementAnswer { option: usize },
    ActivityToggle { activity_id: String },
    ActivityLog { activity_id: String, minutes: u32 },
    ActivityReset,
    OnboardingNext,
    OnboardingBack,
    OnboardingFinish,
    FeedbackOpen,
    FeedbackSubmit,
    ThemeToggle { theme: Option<String> },
    NavigateSection { section: String },
    CallFunction(AllowedFunction),
}

struct Extract<'a> {
    action: LearningAction,
    request: &'a ActionRequest,
}

impl Extract<'_> {
    fn optional(&self, param: &'static str) -> Option<String> {
        self.request.params.non_empty(param).map(str::to_string)
    }

    fn text(&self, param: &'static str) -> Result<String, ParamError> {
        self.optional(param).ok_or(ParamError::Missing {
            action: self.action.name(),
            param,
        })
    }

    fn number<T>(&self, param: &'static str) -> Result<T, ParamError>
    where
        T: FromStr,
    {
        match self.request.params.parse::<T>(param) {
            Some(Ok(value)) => Ok(value),
            Some(Err(_)) => Err(ParamError::NotANumber {
                param,
                value: self.request.params.get(param).unwrap_or_default().to_string(),
            }),
            None => Err(ParamError::Missing {
                action: self.action.name(),
                param,
            }),
        }
    }

    fn ranged<T>(&self, param: &'static str, min: T, max: T) -> Result<T, ParamError>
    where
        T: FromStr + PartialOrd + Copy + Into<i64>,
    {
        let value = self.number::<T>(param)?;
        if value < min || value > max {
            return Err(ParamError::OutOfRange {
                param,
                value: value.into(),
                min: min.into(),
                max: max.into(),
            });
        }
        Ok(value)
    }
}

impl LearningCommand {
    /// Extract the parameters `action` needs from `request`
    pub fn from_request(
        action: LearningAction,
        request: &ActionRequest,
    ) -> Result<Self, ParamError> {
        let p = Extract { action, request };
        let command = match action {
            LearningAction::PageReload => LearningCommand::PageReload,
            LearningAction::DismissById => LearningCommand::DismissById {
                target_id: p.text("target-id")?,
            },
            LearningAction::ModuleModalShow => LearningCommand::ModuleModalShow {
                module_id: p.text("module-id")?,
            },
            LearningAction::ModuleModalClose => LearningCommand::ModuleModalClose,
            LearningAction::ShowDetails => LearningCommand::ShowDetails {
                id: p
                    .optional("module-id")
                    .or_else(|| p.optional("activity-id"))
                    .ok_or(ParamError::Missing {
                        action: action.name(),
                        param: "module-id",
                    })?,
            },
            LearningAction::JokeNext => LearningCommand::JokeNext,
            LearningAction::JokeReveal => LearningCommand::JokeReveal,
            LearningAction::JokeRate => LearningCommand::JokeRate {
                rating: p.ranged("rating", RATING_RANGE.0, RATING_RANGE.1)?,
            },
            LearningAction::QuizStart => LearningCommand::QuizStart {
                quiz_id: p.text("quiz-id")?,
            },
            LearningAction::QuizAnswer => LearningCommand::QuizAnswer {
                question: p.number("question")?,
                option: p.number("option")?,
            },
            LearningAction::QuizRestart => LearningCommand::QuizRestart,
            LearningAction::PlacementOpen => LearningCommand::PlacementOpen,
            LearningAction::PlacementAnswer => LearningCommand::PlacementAnswer {
                option: p.number("option")?,
            },
            LearningAction::ActivityToggle => LearningCommand::ActivityToggle {
                activity_id: p.text("activity-id")?,
            },
            LearningAction::ActivityLog => LearningCommand::ActivityLog {
                activity_id: p.text("activity-id")?,
                minutes: p.ranged("minutes", 1, MAX_ACTIVITY_MINUTES)?,
            },
            LearningAction::ActivityReset => LearningCommand::ActivityReset,
            LearningAction::OnboardingNext => LearningCommand::OnboardingNext,
            LearningAction::OnboardingBack => LearningCommand::OnboardingBack,
            LearningAction::OnboardingFinish => LearningCommand::OnboardingFinish,
            LearningAction::FeedbackOpen => LearningCommand::FeedbackOpen,
            LearningAction::FeedbackSubmit => LearningCommand::FeedbackSubmit,
            LearningAction::ThemeToggle => LearningCommand::ThemeToggle {
                theme: p.optional("theme"),
            },
            LearningAction::NavigateSection => LearningCommand::NavigateSection {
                section: p.text("section")?,
            },
            LearningAction::CallFunction => {
                let name = p.text("fn")?;
                let function = AllowedFunction::from_name(&name)
                    .ok_or(ParamError::DisallowedFunction(name))?;
                LearningCommand::CallFunction(function)
            }
        };
        Ok(command)
    }
}
