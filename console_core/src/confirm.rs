//! Two-step confirmation for destructive actions.
//!
//! `open` puts a subject on screen, `confirm` hands back a [`Confirmed`]
//! token and closes the dialog. Operations that destroy data take the
//! token, so they cannot run without the user having said yes.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Danger,
    Warning,
    Info,
}

impl Variant {
    pub fn icon(self) -> &'static str {
        match self {
            Variant::Danger => "bi-trash",
            Variant::Warning => "bi-exclamation-triangle",
            Variant::Info => "bi-info-circle",
        }
    }

    pub fn color_class(self) -> &'static str {
        match self {
            Variant::Danger => "danger",
            Variant::Warning => "warning",
            Variant::Info => "info",
        }
    }

    pub fn default_label(self) -> &'static str {
        match self {
            Variant::Danger => "Delete",
            Variant::Warning => "Continue",
            Variant::Info => "OK",
        }
    }
}

/// Proof that the user confirmed an action on `T`.
#[derive(Debug, PartialEq, Eq)]
pub struct Confirmed<T>(T);

impl<T> Confirmed<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn subject(&self) -> &T {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfirmDialog<T> {
    pub variant: Variant,
    pub title: String,
    pub message: String,
    subject: Option<T>,
}

impl<T> ConfirmDialog<T> {
    pub fn new(variant: Variant) -> Self {
        Self { variant, title: String::new(), message: String::new(), subject: None }
    }

    pub fn open(&mut self, subject: T, title: impl Into<String>, message: impl Into<String>) {
        self.subject = Some(subject);
        self.title = title.into();
        self.message = message.into();
    }

    pub fn is_open(&self) -> bool {
        self.subject.is_some()
    }

    pub fn subject(&self) -> Option<&T> {
        self.subject.as_ref()
    }

    /// Closes the dialog; yields the token at most once per `open`.
    pub fn confirm(&mut self) -> Option<Confirmed<T>> {
        self.subject.take().map(Confirmed)
    }

    pub fn cancel(&mut self) {
        self.subject = None;
    }
}

impl<T> Default for ConfirmDialog<T> {
    fn default() -> Self {
        Self::new(Variant::Danger)
    }
}

#[cfg(test)]
pub(crate) fn confirmed<T>(subject: T) -> Confirmed<T> {
    Confirmed(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_yields_once_and_closes() {
        let mut dialog = ConfirmDialog::new(Variant::Danger);
        dialog.open(7, "Remove duty", "Remove this pending duty?");
        assert!(dialog.is_open());
        assert_eq!(dialog.confirm().map(Confirmed::into_inner), Some(7));
        assert!(!dialog.is_open());
        assert!(dialog.confirm().is_none());
    }

    #[test]
    fn cancel_discards_the_subject() {
        let mut dialog: ConfirmDialog<u32> = ConfirmDialog::default();
        dialog.open(1, "t", "m");
        dialog.cancel();
        assert!(dialog.confirm().is_none());
    }

    #[test]
    fn variants_pick_icon_and_color() {
        assert_eq!(Variant::Warning.color_class(), "warning");
        assert_eq!(Variant::Danger.icon(), "bi-trash");
    }
}
