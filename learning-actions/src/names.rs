//! The closed name sets used in the learning app's markup

use ui_dispatch::Marker;

/// Every action a node may name in its `data-action` attribute
#[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LearningAction {
    PageReload,
    DismissById,
    ModuleModalShow,
    ModuleModalClose,
    ShowDetails,
    JokeNext,
    JokeReveal,
    JokeRate,
    QuizStart,
    QuizAnswer,
    QuizRestart,
    PlacementOpen,
    PlacementAnswer,
    ActivityToggle,
    ActivityLog,
    ActivityReset,
    OnboardingNext,
    OnboardingBack,
    OnboardingFinish,
    FeedbackOpen,
    FeedbackSubmit,
    ThemeToggle,
    NavigateSection,
    CallFunction,
}

/// Functions the host application exposes to the dispatch table
#[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collaborator {
    ReloadPage,
    ShowModuleModal,
    CloseModuleModal,
    ShowDetails,
    NextJoke,
    RevealPunchline,
    RateJoke,
    StartQuiz,
    AnswerQuiz,
    RestartQuiz,
    Navigate,
    StartPlacement,
    AnswerPlacement,
    ToggleActivity,
    LogActivity,
    ResetActivities,
    OnboardingStep,
    FinishOnboarding,
    OpenFeedback,
    SubmitFeedback,
    ToggleTheme,
    OpenSettings,
    ExportProgress,
    ResetProgress,
    ShowHelp,
}

/// The only functions `call-function` markup may name
#[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllowedFunction {
    OpenSettings,
    ExportProgress,
    ResetProgress,
    ShowHelp,
}

impl AllowedFunction {
    pub fn collaborator(self) -> Collaborator {
        match self {
            AllowedFunction::OpenSettings => Collaborator::OpenSettings,
            AllowedFunction::ExportProgress => Collaborator::ExportProgress,
            AllowedFunction::ResetProgress => Collaborator::ResetProgress,
            AllowedFunction::ShowHelp => Collaborator::ShowHelp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_names() {
        assert_eq!(LearningAction::DismissById.name(), "dismiss-by-id");
        assert_eq!(
            LearningAction::from_name("module-modal-show"),
            Some(LearningAction::ModuleModalShow)
        );
        assert_eq!(LearningAction::all().len(), 24);
        assert_eq!(Collaborator::RevealPunchline.name(), "reveal-punchline");
    }

    #[test]
    fn test_allowed_functions_map_to_collaborators() {
        for function in AllowedFunction::all() {
            assert_eq!(function.collaborator().name(), function.name());
        }
        assert_eq!(AllowedFunction::from_name("eval"), None);
    }
}
