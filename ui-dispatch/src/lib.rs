//! ui-dispatch: Centralized action dispatch for interactive UI trees
//!
//! One listener at the root of the tree turns every interaction into at most
//! one named action, checks that the application is ready to run it, and
//! hands it to an exhaustive dispatch table. Collaborators are called through
//! a wrapper that contains their failures.
//!
//! # Example
//! ```ignore
//! use ui_dispatch::prelude::*;
//!
//! #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Action {
//!     PageReload,
//!     ModuleModalShow,
//! }
//!
//! #[derive(Marker, Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Collaborator {
//!     ReloadPage,
//!     ShowModuleModal,
//! }
//! ```

// Re-export everything from core
pub use ui_dispatch_core::*;

// Re-export derive macros
pub use ui_dispatch_macros::Marker;

/// Prelude for convenient imports
pub mod prelude {
    pub use ui_dispatch_core::prelude::*;

    // Derive macros
    pub use ui_dispatch_macros::Marker;
}
