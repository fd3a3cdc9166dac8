//! Tests for #[derive(Marker)] macro

use ui_dispatch::prelude::*;

#[test]
fn test_kebab_case_names() {
    #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Action {
        PageReload,
        ModuleModalShow,
        Joke,
    }

    assert_eq!(Action::PageReload.name(), "page-reload");
    assert_eq!(Action::ModuleModalShow.name(), "module-modal-show");
    assert_eq!(Action::Joke.name(), "joke");
    assert_eq!(Action::names(), vec!["page-reload", "module-modal-show", "joke"]);
}

#[test]
fn test_from_name_is_exact() {
    #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Section {
        Jokes,
        Placement,
    }

    assert_eq!(Section::from_name("placement"), Some(Section::Placement));
    assert_eq!(Section::from_name("Placement"), None);
    assert_eq!(Section::from_name(" jokes"), None);
    assert_eq!(Section::from_name(""), None);
}

#[test]
fn test_rename() {
    #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Function {
        #[marker(rename = "openSettings")]
        OpenSettings,
        ShowHelp,
    }

    assert_eq!(Function::OpenSettings.name(), "openSettings");
    assert_eq!(Function::from_name("openSettings"), Some(Function::OpenSettings));
    assert_eq!(Function::from_name("open-settings"), None);
    assert_eq!(Function::from_name("show-help"), Some(Function::ShowHelp));
}

#[test]
fn test_all_in_declaration_order() {
    #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Step {
        Next,
        Back,
        Finish,
    }

    assert_eq!(Step::all(), &[Step::Next, Step::Back, Step::Finish]);
    for step in Step::all() {
        assert_eq!(Step::from_name(step.name()), Some(*step));
    }
}

#[test]
fn test_usable_as_collaborator_key() {
    #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Collaborator {
        ReloadPage,
        NextJoke,
    }

    let collaborators = Collaborators::<Collaborator>::new();
    collaborators.register(Collaborator::NextJoke, hook(|_| HookOutcome::Done));
    assert_eq!(collaborators.registered(), vec!["next-joke"]);
}
