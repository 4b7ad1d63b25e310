//! Evaluation-time configuration for a session.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options applied to every expression in a session.
///
/// Each set option contributes a variable to the command's local scope and an
/// assignment to its preamble (see [`cas_commands`](Self::cas_commands)), so
/// the whole batch is evaluated under the same engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionOptions {
    /// Whether the engine should simplify results. `None` leaves the
    /// engine's own default in place.
    pub simplify: Option<bool>,

    /// Whether unbound variables may be assumed positive, which changes how
    /// the engine resolves roots and absolute values.
    pub assume_positive: Option<bool>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { simplify: Some(true), assume_positive: None }
    }
}

/// The preamble contributed by a [`SessionOptions`]: variable names to
/// declare in the command's local scope, and the assignments that set them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasCommands {
    pub names: Vec<String>,
    pub commands: Vec<String>,
}

impl SessionOptions {
    /// The names and assignment commands this option set contributes to a
    /// batch command. Names and commands stay index-aligned.
    pub fn cas_commands(&self) -> CasCommands {
        let mut names = Vec::new();
        let mut commands = Vec::new();
        if let Some(simplify) = self.simplify {
            names.push("simp".to_string());
            commands.push(format!("simp:{simplify}"));
        }
        if let Some(assume) = self.assume_positive {
            names.push("assume_pos".to_string());
            commands.push(format!("assume_pos:{assume}"));
        }
        CasCommands { names, commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_simplify() {
        let commands = SessionOptions::default().cas_commands();
        assert_eq!(commands.names, ["simp"]);
        assert_eq!(commands.commands, ["simp:true"]);
    }

    #[test]
    fn unset_options_contribute_nothing() {
        let options = SessionOptions { simplify: None, assume_positive: None };
        assert_eq!(options.cas_commands(), CasCommands::default());
    }

    #[test]
    fn all_options_stay_aligned() {
        let options = SessionOptions {
            simplify: Some(false),
            assume_positive: Some(true),
        };
        let commands = options.cas_commands();
        assert_eq!(commands.names, ["simp", "assume_pos"]);
        assert_eq!(commands.commands, ["simp:false", "assume_pos:true"]);
    }
}
