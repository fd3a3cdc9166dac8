//! The learning application's dispatch table

use ui_dispatch::{
    Arg, ConfigError, DispatchConfig, DispatchContext, DispatchTable, Dispatcher, Marker,
};

use crate::command::{LearningCommand, ParamError};
use crate::names::{Collaborator, LearningAction};
use crate::placement::PlacementFlow;

/// Dispatch table of the learning application
#[derive(Debug, Clone, Copy, Default)]
pub struct LearningTable;

impl LearningTable {
    /// A dispatcher running this table
    pub fn dispatcher(config: &DispatchConfig) -> Result<Dispatcher<Self>, ConfigError> {
        Dispatcher::new(LearningTable, config)
    }
}

impl DispatchTable for LearningTable {
    type Kind = LearningAction;
    type Hook = Collaborator;

    fn dispatch(&self, kind: LearningAction, cx: DispatchContext<'_, Collaborator>) {
        match LearningCommand::from_request(kind, cx.request()) {
            Ok(command) => execute(command, &cx),
            Err(error @ ParamError::DisallowedFunction(_)) => {
                tracing::warn!(action = kind.name(), %error, "blocked call-function");
            }
            Err(error) => {
                tracing::warn!(action = kind.name(), %error, "invalid action parameters; ignoring");
            }
        }
    }
}

fn execute(command: LearningCommand, cx: &DispatchContext<'_, Collaborator>) {
    match command {
        LearningCommand::PageReload => {
            cx.call(Collaborator::ReloadPage, &[]);
        }
        LearningCommand::DismissById { target_id } => dismiss(&target_id, cx),
        LearningCommand::ModuleModalShow { module_id } => {
            cx.call(Collaborator::ShowModuleModal, &[Arg::Text(module_id)]);
        }
        LearningCommand::ModuleModalClose => {
            cx.call(Collaborator::CloseModuleModal, &[]);
        }
        LearningCommand::ShowDetails { id } => {
            cx.call(Collaborator::ShowDetails, &[Arg::Text(id)]);
        }
        LearningCommand::JokeNext => {
            cx.call(Collaborator::NextJoke, &[]);
        }
        LearningCommand::JokeReveal => {
            cx.call(Collaborator::RevealPunchline, &[]);
        }
        LearningCommand::JokeRate { rating } => {
            cx.call(Collaborator::RateJoke, &[Arg::Int(rating.into())]);
        }
        LearningCommand::QuizStart { quiz_id } => {
            cx.call(Collaborator::StartQuiz, &[Arg::Text(quiz_id)]);
        }
        LearningCommand::QuizAnswer { question, option } => {
            cx.call(
                Collaborator::AnswerQuiz,
                &[Arg::Index(question), Arg::Index(option)],
            );
        }
        LearningCommand::QuizRestart => {
            cx.call(Collaborator::RestartQuiz, &[]);
        }
        LearningCommand::PlacementOpen => {
            let flow = PlacementFlow {
                collaborators: cx.collaborators(),
                document: cx.document().clone(),
                frames: cx.frames(),
                notifier: cx.notifier().clone(),
            };
            cx.spawn(LearningAction::PlacementOpen.name(), flow.run());
        }
        LearningCommand::PlacementAnswer { option } => {
            cx.call(Collaborator::AnswerPlacement, &[Arg::Index(option)]);
        }
        LearningCommand::ActivityToggle { activity_id } => {
            cx.call(Collaborator::ToggleActivity, &[Arg::Text(activity_id)]);
        }
        LearningCommand::ActivityLog {
            activity_id,
            minutes,
        } => {
            cx.call(
                Collaborator::LogActivity,
                &[Arg::Text(activity_id), Arg::Int(minutes.into())],
            );
        }
        LearningCommand::ActivityReset => {
            cx.call(Collaborator::ResetActivities, &[]);
        }
        LearningCommand::OnboardingNext => {
            cx.call(Collaborator::OnboardingStep, &[Arg::Int(1)]);
        }
        LearningCommand::OnboardingBack => {
            cx.call(Collaborator::OnboardingStep, &[Arg::Int(-1)]);
        }
        LearningCommand::OnboardingFinish => {
            cx.call(Collaborator::FinishOnboarding, &[]);
        }
        LearningCommand::FeedbackOpen => {
            cx.call(Collaborator::OpenFeedback, &[]);
        }
        LearningCommand::FeedbackSubmit => {
            cx.call(Collaborator::SubmitFeedback, &[]);
        }
        LearningCommand::ThemeToggle { theme } => {
            let args: Vec<Arg> = theme.into_iter().map(Arg::Text).collect();
            cx.call(Collaborator::ToggleTheme, &args);
        }
        LearningCommand::NavigateSection { section } => {
            cx.call(Collaborator::Navigate, &[Arg::Text(section)]);
        }
        LearningCommand::CallFunction(function) => {
            tracing::debug!(function = function.name(), "allow-listed call-function");
            cx.call(function.collaborator(), &[]);
        }
    }
}

/// Hide the element with `target_id`; a missing element is not an error
fn dismiss(target_id: &str, cx: &DispatchContext<'_, Collaborator>) {
    let result = cx.with_document(|doc| match doc.element_by_id(target_id) {
        Some(node) => doc.hide(node).map(Some),
        None => Ok(None),
    });
    match result {
        Ok(Some(_)) => tracing::debug!(target_id, "dismissed element"),
        Ok(None) => tracing::debug!(target_id, "nothing to dismiss"),
        Err(error) => tracing::warn!(target_id, %error, "could not dismiss element"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ui_dispatch::testing::{CallLog, ImmediateFrames};
    use ui_dispatch::{
        lock, share, Document, ElementSpec, Interaction, NodeId, Readiness, ReadinessGate,
        SharedDocument,
    };
    use std::sync::Arc;

    fn single(spec: ElementSpec) -> (SharedDocument, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let node = doc.insert(root, spec).unwrap();
        (share(doc), node)
    }

    fn ready() -> (Dispatcher<LearningTable>, CallLog) {
        let log = CallLog::new();
        let dispatcher = LearningTable::dispatcher(&DispatchConfig::default())
            .unwrap()
            .with_gate(ReadinessGate::with_state(Readiness::Ready))
            .with_frames(Arc::new(ImmediateFrames::new()));
        for collaborator in Collaborator::all() {
            dispatcher
                .collaborators()
                .register(*collaborator, log.hook(collaborator.name()));
        }
        (dispatcher, log)
    }

    #[test]
    fn test_onboarding_steps() {
        let (dispatcher, log) = ready();
        let (doc, next) = single(ElementSpec::new("button").attr("data-action", "onboarding-next"));
        dispatcher.handle(&doc, Interaction::Click { origin: next });
        let (doc, back) = single(ElementSpec::new("button").attr("data-action", "onboarding-back"));
        dispatcher.handle(&doc, Interaction::Click { origin: back });

        assert_eq!(
            log.calls_to("onboarding-step"),
            vec![vec![Arg::Int(1)], vec![Arg::Int(-1)]]
        );
    }

    #[test]
    fn test_invalid_params_call_nothing() {
        let (dispatcher, log) = ready();
        let (doc, node) = single(
            ElementSpec::new("button")
                .attr("data-action", "joke-rate")
                .attr("data-rating", "11"),
        );
        let outcome = dispatcher.handle(&doc, Interaction::Click { origin: node });
        assert!(outcome.is_dispatched());
        assert!(log.is_empty());
    }

    #[test]
    fn test_theme_toggle_optional_arg() {
        let (dispatcher, log) = ready();
        let (doc, plain) = single(ElementSpec::new("button").attr("data-action", "theme-toggle"));
        dispatcher.handle(&doc, Interaction::Click { origin: plain });
        let (doc, dark) = single(
            ElementSpec::new("button")
                .attr("data-action", "theme-toggle")
                .attr("data-theme", "dark"),
        );
        dispatcher.handle(&doc, Interaction::Click { origin: dark });

        assert_eq!(
            log.calls_to("toggle-theme"),
            vec![vec![], vec![Arg::text("dark")]]
        );
    }

    #[test]
    fn test_dismiss_hides_target() {
        let (dispatcher, _) = ready();
        let mut doc = Document::new();
        let root = doc.root();
        let banner = doc.insert(root, ElementSpec::new("div").id("banner-1")).unwrap();
        let close = doc
            .insert(
                banner,
                ElementSpec::new("button")
                    .attr("data-action", "dismiss-by-id")
                    .attr("data-target-id", "banner-1"),
            )
            .unwrap();
        let doc = share(doc);

        dispatcher.handle(&doc, Interaction::Click { origin: close });
        assert!(lock(&doc).node(banner).unwrap().is_hidden());
    }
}
