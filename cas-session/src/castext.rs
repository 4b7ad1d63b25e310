//! Substitution of evaluated entries into free text.
//!
//! Question text refers to session entries with `@key@` placeholders, e.g.
//! `"The derivative of @p@ is @q@."`. Substitution degrades gracefully: an
//! entry that errored contributes its original raw text instead of a blank
//! or the error itself.

use crate::session::Session;

impl Session {
    /// Replaces every `@key@` placeholder in `template` with the matching
    /// entry's display form, or with its raw text when the entry carries
    /// errors. Evaluates the session first if needed.
    ///
    /// Entries are applied in list order, and a substitution consumes the
    /// placeholder, so when two entries share a key the *first* one in list
    /// order wins here. That is the opposite tie-break from
    /// [`value_of`](Session::value_of), which prefers the latest entry;
    /// both behaviors are deliberate.
    pub fn render_into(&mut self, template: &str) -> String {
        self.ensure_instantiated();
        if self.entries().is_empty() {
            return template.to_string();
        }

        let mut text = template.to_string();
        for entry in self.entries() {
            let placeholder = format!("@{}@", entry.key());
            if entry.has_errors() {
                text = text.replace(&placeholder, entry.raw());
            } else if text.contains(&placeholder) {
                text = text.replace(&placeholder, entry.display().unwrap_or_default());
            }
        }
        text
    }
}
