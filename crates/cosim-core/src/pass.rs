//! Pass identifiers and per-type capability flags.
//!
//! A timestep visits every object up to four times: the two top-down passes,
//! the (possibly repeated) bottom-up pass, and commit.  `Pass` names one such
//! visit; `PassSet` records which visits a given object type participates in,
//! so the scheduler can skip lifecycle calls a type does not implement.

use std::fmt;

// ── Pass ──────────────────────────────────────────────────────────────────────

/// One scheduler-dispatched lifecycle call within a timestep.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pass {
    /// First top-down pass — parents publish values their children will read.
    Presync,
    /// Bottom-up pass — children propagate state upward.  The only pass
    /// subject to convergence retry (`return == t1`).
    Sync,
    /// Second top-down pass — derived quantities finalized after convergence.
    Postsync,
    /// Once per converged step, after all three passes.
    Commit,
}

impl Pass {
    /// `true` for the bottom-up pass, where `return == t1` requests a retry.
    #[inline]
    pub fn is_bottom_up(self) -> bool {
        self == Pass::Sync
    }

    /// The capability bit corresponding to this pass.
    #[inline]
    pub fn flag(self) -> PassSet {
        match self {
            Pass::Presync  => PassSet::PRESYNC,
            Pass::Sync     => PassSet::SYNC,
            Pass::Postsync => PassSet::POSTSYNC,
            Pass::Commit   => PassSet::COMMIT,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::Presync  => "presync",
            Pass::Sync     => "sync",
            Pass::Postsync => "postsync",
            Pass::Commit   => "commit",
        };
        write!(f, "{name}")
    }
}

// ── PassSet ───────────────────────────────────────────────────────────────────

/// Bit set of lifecycle calls an object type implements.
///
/// Declared on the type descriptor at registration time; the scheduler only
/// ever calls through this capability interface.  `NOTIFY` gates external
/// property writes rather than a scheduled pass.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassSet(u8);

impl PassSet {
    pub const EMPTY:    PassSet = PassSet(0);
    pub const PRESYNC:  PassSet = PassSet(1 << 0);
    pub const SYNC:     PassSet = PassSet(1 << 1);
    pub const POSTSYNC: PassSet = PassSet(1 << 2);
    pub const COMMIT:   PassSet = PassSet(1 << 3);
    pub const NOTIFY:   PassSet = PassSet(1 << 4);

    /// All four scheduled passes plus the notify hook.
    pub const ALL: PassSet = PassSet(0b1_1111);

    /// `true` if every bit of `other` is present in `self`.
    #[inline]
    pub fn contains(self, other: PassSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two sets.
    #[inline]
    pub fn with(self, other: PassSet) -> PassSet {
        PassSet(self.0 | other.0)
    }

    /// `true` if no capability bits are set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for PassSet {
    /// Types default to participating in everything; descriptors narrow this.
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for PassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in [
            (Self::PRESYNC,  "presync"),
            (Self::SYNC,     "sync"),
            (Self::POSTSYNC, "postsync"),
            (Self::COMMIT,   "commit"),
            (Self::NOTIFY,   "notify"),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}
