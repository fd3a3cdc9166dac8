//! Closed sets of names that can appear in markup

use std::fmt::Debug;
use std::hash::Hash;

/// A closed, enumerable set of names
///
/// Action kinds, collaborator names and allow-listed functions are all
/// modelled as unit enums implementing this trait, so that a name read from
/// markup can only ever map onto a variant known at compile time.
///
/// Use `#[derive(Marker)]` from `ui-dispatch-macros` to generate the
/// implementation. Variant names become kebab-case (`ModuleModalShow` →
/// `"module-modal-show"`) unless overridden with `#[marker(rename = "...")]`.
///
/// # Example
/// ```
/// use ui_dispatch_core::Marker;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Section {
///     Jokes,
///     Placement,
/// }
///
/// impl Marker for Section {
///     fn name(&self) -> &'static str {
///         match self {
///             Section::Jokes => "jokes",
///             Section::Placement => "placement",
///         }
///     }
///
///     fn from_name(name: &str) -> Option<Self> {
///         match name {
///             "jokes" => Some(Section::Jokes),
///             "placement" => Some(Section::Placement),
///             _ => None,
///         }
///     }
///
///     fn all() -> &'static [Self] {
///         &[Section::Jokes, Section::Placement]
///     }
/// }
///
/// assert_eq!(Section::from_name("placement"), Some(Section::Placement));
/// assert_eq!(Section::from_name("settings"), None);
/// ```
pub trait Marker: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// The name as it appears in markup
    fn name(&self) -> &'static str;

    /// Parse a name read from markup
    fn from_name(name: &str) -> Option<Self>;

    /// Every variant, in declaration order
    fn all() -> &'static [Self];

    /// All names, in declaration order
    fn names() -> Vec<&'static str> {
        Self::all().iter().map(Marker::name).collect()
    }
}
