//! Privilege levels.
//!
//! This architecture defines two privilege levels: supervisor mode, in which
//! all SPRs and all memory are accessible, and user mode, in which MMU
//! permission bits and a handful of supervisor-only SPRs are enforced.
//! There is no machine mode; the supervisor-register `SM` bit is the only
//! level transition.

/// A CPU privilege level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivilegeMode {
    /// User mode. MMU permission bits and supervisor-only SPR accesses are
    /// enforced.
    User = 0,
    /// Supervisor mode. Entered on reset and on every exception; left by an
    /// explicit `l.rfe` that restores the prior mode from the shadow SPR.
    Supervisor = 1,
}

impl PrivilegeMode {
    /// Converts the supervisor-register `SM` bit to a privilege mode.
    #[must_use]
    pub fn from_supervisor_bit(sm: bool) -> Self {
        if sm {
            PrivilegeMode::Supervisor
        } else {
            PrivilegeMode::User
        }
    }

    /// Returns the human-readable name of this privilege level.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PrivilegeMode::User => "user",
            PrivilegeMode::Supervisor => "supervisor",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supervisor_bit_round_trips() {
        assert_eq!(PrivilegeMode::from_supervisor_bit(true), PrivilegeMode::Supervisor);
        assert_eq!(PrivilegeMode::from_supervisor_bit(false), PrivilegeMode::User);
    }
}
