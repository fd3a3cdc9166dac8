//! Stand-in collaborators that print what the real modules would do

use std::time::Duration;

use learning_actions::Collaborator;
use ui_dispatch::{
    async_hook, hook, lock, Arg, Collaborators, HookError, HookOutcome, Marker, SharedDocument,
};

use crate::page::render_placement;

fn describe(args: &[Arg]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Register a printing hook for every collaborator, plus a few with behaviour
pub fn register(
    collaborators: &Collaborators<Collaborator>,
    document: SharedDocument,
    flaky_feedback: bool,
) {
    for &name in Collaborator::all() {
        collaborators.register(
            name,
            hook(move |args| {
                println!("    -> {}({})", name.name(), describe(args));
                HookOutcome::Done
            }),
        );
    }

    collaborators.register(
        Collaborator::Navigate,
        hook(move |args| {
            println!("    -> navigate({})", describe(args));
            if args.first().and_then(Arg::as_text) != Some("placement") {
                return HookOutcome::Done;
            }
            render_placement(&mut lock(&document))
                .map_err(|e| HookError::new(e.to_string()))
                .into()
        }),
    );

    // Sync failure, contained by the invoker
    collaborators.register(
        Collaborator::ExportProgress,
        hook(|_| HookOutcome::failed("progress store is locked")),
    );

    if flaky_feedback {
        collaborators.register(
            Collaborator::SubmitFeedback,
            async_hook(|_| async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Err(HookError::new("feedback endpoint unreachable"))
            }),
        );
    }

    // Theming is an optional module that never loaded
    collaborators.unregister(Collaborator::ToggleTheme);
}
