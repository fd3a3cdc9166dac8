//! Throttled user-facing notices
//!
//! Blocked actions are explained to the user through a notice. At most one
//! throttled notice is shown per cooldown window; anything arriving inside the
//! window is dropped, not queued.
//!
//! Notices go to a registered [`NoticeSurface`] when one exists. Without one
//! the throttle keeps a self-contained fallback [`Toast`] that replaces any
//! visible toast and expires on its own. This path has no dependency on the
//! rest of the UI having initialized.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::invoke::panic_message;

/// Default minimum gap between throttled notices
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(900);

/// Default lifetime of the fallback toast
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Severity::Info => Color::Rgb(80, 180, 255),
            Severity::Warning => Color::Rgb(255, 191, 0),
            Severity::Error => Color::Rgb(255, 100, 150),
        }
    }
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

/// Texts used for blocked-action notices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeMessages {
    /// Shown while startup is still in progress
    pub not_ready: String,
    /// Shown once startup has failed; must not suggest waiting
    pub init_failed: String,
}

impl Default for NoticeMessages {
    fn default() -> Self {
        Self {
            not_ready: "Still loading, please try again in a moment.".to_string(),
            init_failed: "The app failed to start. Please reload the page.".to_string(),
        }
    }
}

/// A richer notification surface owned by the host application
pub trait NoticeSurface: Send + Sync {
    fn show(&self, notice: &Notice);
}

/// The self-contained fallback message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub notice: Notice,
    pub shown_at: Instant,
    pub expires_at: Instant,
}

impl Toast {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl Widget for &Toast {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let accent = self.notice.severity.color();
        Clear.render(area, buf);
        Paragraph::new(self.notice.message.as_str())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Rgb(240, 240, 245)))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            )
            .render(area, buf);
    }
}

/// Bottom-centred area for a toast inside `area`
pub fn toast_area(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + area.height.saturating_sub(height);
    Rect::new(x, y, width, height)
}

/// What happened to a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeOutcome {
    /// Handed to the registered surface
    Delegated,
    /// Shown as the fallback toast
    Fallback,
    /// Dropped by the cooldown
    Suppressed,
}

impl NoticeOutcome {
    pub fn was_shown(self) -> bool {
        !matches!(self, NoticeOutcome::Suppressed)
    }
}

/// Cooldown bookkeeping plus the fallback toast
pub struct NoticeThrottle {
    cooldown: Duration,
    toast_duration: Duration,
    last_shown: Option<Instant>,
    surface: Option<Arc<dyn NoticeSurface>>,
    toast: Option<Toast>,
    shown: u64,
    suppressed: u64,
}

impl std::fmt::Debug for NoticeThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeThrottle")
            .field("cooldown", &self.cooldown)
            .field("toast_duration", &self.toast_duration)
            .field("last_shown", &self.last_shown)
            .field("has_surface", &self.surface.is_some())
            .field("toast", &self.toast)
            .field("shown", &self.shown)
            .field("suppressed", &self.suppressed)
            .finish()
    }
}

impl Default for NoticeThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN, DEFAULT_TOAST_DURATION)
    }
}

impl NoticeThrottle {
    pub fn new(cooldown: Duration, toast_duration: Duration) -> Self {
        Self {
            cooldown,
            toast_duration,
            last_shown: None,
            surface: None,
            toast: None,
            shown: 0,
            suppressed: 0,
        }
    }

    pub fn set_surface(&mut self, surface: Option<Arc<dyn NoticeSurface>>) {
        self.surface = surface;
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Show `notice` unless another one was shown within the cooldown
    pub fn notify(&mut self, notice: Notice) -> NoticeOutcome {
        self.notify_at(notice, Instant::now())
    }

    pub fn notify_at(&mut self, notice: Notice, now: Instant) -> NoticeOutcome {
        let admission = self.admit(notice, now, true);
        self.complete(admission, now)
    }

    /// Show `notice` regardless of the cooldown; still restarts the window
    pub fn show(&mut self, notice: Notice) -> NoticeOutcome {
        self.show_at(notice, Instant::now())
    }

    pub fn show_at(&mut self, notice: Notice, now: Instant) -> NoticeOutcome {
        let admission = self.admit(notice, now, false);
        self.complete(admission, now)
    }

    /// Apply the cooldown and count the notice; delivery to a surface is left to the caller
    fn admit(&mut self, notice: Notice, now: Instant, throttled: bool) -> Admission {
        if throttled {
            if let Some(last) = self.last_shown {
                if now.saturating_duration_since(last) < self.cooldown {
                    self.suppressed += 1;
                    tracing::debug!(message = %notice.message, "notice suppressed by cooldown");
                    return Admission::Suppressed;
                }
            }
        }
        self.last_shown = Some(now);
        self.shown += 1;

        match &self.surface {
            Some(surface) => Admission::Deliver(Arc::clone(surface), notice),
            None => {
                self.set_toast(notice, now);
                Admission::Fallback
            }
        }
    }

    fn complete(&mut self, admission: Admission, now: Instant) -> NoticeOutcome {
        match admission {
            Admission::Suppressed => NoticeOutcome::Suppressed,
            Admission::Fallback => NoticeOutcome::Fallback,
            Admission::Deliver(surface, notice) => {
                if deliver(surface.as_ref(), &notice) {
                    NoticeOutcome::Delegated
                } else {
                    self.set_toast(notice, now);
                    NoticeOutcome::Fallback
                }
            }
        }
    }

    fn set_toast(&mut self, notice: Notice, now: Instant) {
        self.toast = Some(Toast {
            notice,
            shown_at: now,
            expires_at: now + self.toast_duration,
        });
    }

    /// The fallback toast, if it has not expired
    pub fn current_toast(&self) -> Option<&Toast> {
        self.current_toast_at(Instant::now())
    }

    pub fn current_toast_at(&self, now: Instant) -> Option<&Toast> {
        self.toast.as_ref().filter(|toast| toast.is_visible_at(now))
    }

    /// Drop an expired toast
    pub fn prune(&mut self) {
        let now = Instant::now();
        if self.toast.as_ref().is_some_and(|t| !t.is_visible_at(now)) {
            self.toast = None;
        }
    }

    pub fn shown_count(&self) -> u64 {
        self.shown
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }
}

enum Admission {
    Suppressed,
    Fallback,
    Deliver(Arc<dyn NoticeSurface>, Notice),
}

/// Hand `notice` to `surface`; a panicking surface reports `false`
fn deliver(surface: &dyn NoticeSurface, notice: &Notice) -> bool {
    match catch_unwind(AssertUnwindSafe(|| surface.show(notice))) {
        Ok(()) => true,
        Err(payload) => {
            tracing::error!(
                message = %notice.message,
                panic = %panic_message(payload.as_ref()),
                "notice surface panicked; falling back to toast"
            );
            false
        }
    }
}

/// Cloneable handle to a shared [`NoticeThrottle`]
///
/// The surface is called with the throttle unlocked, so it may notify again.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    inner: Arc<Mutex<NoticeThrottle>>,
}

impl Notifier {
    pub fn new(throttle: NoticeThrottle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(throttle)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NoticeThrottle> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn notify(&self, notice: Notice) -> NoticeOutcome {
        self.publish(notice, true)
    }

    pub fn show(&self, notice: Notice) -> NoticeOutcome {
        self.publish(notice, false)
    }

    fn publish(&self, notice: Notice, throttled: bool) -> NoticeOutcome {
        let now = Instant::now();
        let admission = self.lock().admit(notice, now, throttled);
        match admission {
            Admission::Suppressed => NoticeOutcome::Suppressed,
            Admission::Fallback => NoticeOutcome::Fallback,
            Admission::Deliver(surface, notice) => {
                if deliver(surface.as_ref(), &notice) {
                    NoticeOutcome::Delegated
                } else {
                    self.lock().set_toast(notice, now);
                    NoticeOutcome::Fallback
                }
            }
        }
    }

    pub fn set_surface(&self, surface: Option<Arc<dyn NoticeSurface>>) {
        self.lock().set_surface(surface);
    }

    pub fn current_toast(&self) -> Option<Toast> {
        self.lock().current_toast().cloned()
    }

    pub fn shown_count(&self) -> u64 {
        self.lock().shown_count()
    }

    pub fn suppressed_count(&self) -> u64 {
        self.lock().suppressed_count()
    }

    /// Run `f` with the throttle locked
    pub fn with<R>(&self, f: impl FnOnce(&mut NoticeThrottle) -> R) -> R {
        f(&mut self.lock())
    }
}
