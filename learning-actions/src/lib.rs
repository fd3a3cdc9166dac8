//! Dispatch table for the learning application
//!
//! Maps every `data-action` marker used in the learning app's markup (jokes,
//! quizzes, the placement test, the activity tracker, onboarding, feedback and
//! theming) onto the collaborator functions the app registers at startup.
//!
//! ```ignore
//! use learning_actions::{Collaborator, LearningTable};
//! use ui_dispatch::prelude::*;
//!
//! let dispatcher = LearningTable::dispatcher(&DispatchConfig::default())?;
//! dispatcher
//!     .collaborators()
//!     .register(Collaborator::NextJoke, hook(|_| HookOutcome::Done));
//! dispatcher.gate().mark_ready();
//! ```

pub mod command;
pub mod names;
pub mod placement;
pub mod table;

pub use command::{LearningCommand, ParamError};
pub use names::{AllowedFunction, Collaborator, LearningAction};
pub use placement::{PlacementFlow, PLACEMENT_ELEMENTS, PLACEMENT_SECTION};
pub use table::LearningTable;
