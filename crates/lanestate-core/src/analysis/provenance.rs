use crate::format::format_inst_ref;
use crate::function::Function;
use crate::instructions::InstId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type AllocaSet = BTreeSet<InstId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProvenanceKind {
    Tracked,
    External,
    Wildcard,
}

/// Which allocation sites a pointer may point into.
///
/// `Tracked` pointers point only into the listed allocations. `External` pointers may also point
/// into memory the analysis does not track. `Wildcard` pointers may point anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Tracked(AllocaSet),
    External(AllocaSet),
    Wildcard,
}

impl Default for Provenance {
    fn default() -> Self {
        Provenance::Tracked(AllocaSet::new())
    }
}

impl Provenance {
    pub fn from_alloca(alloca: InstId) -> Self {
        Provenance::Tracked(AllocaSet::from([alloca]))
    }

    pub fn from_kind(kind: ProvenanceKind) -> Self {
        match kind {
            ProvenanceKind::Tracked => Provenance::Tracked(AllocaSet::new()),
            ProvenanceKind::External => Provenance::External(AllocaSet::new()),
            ProvenanceKind::Wildcard => Provenance::Wildcard,
        }
    }

    pub fn tracked(allocas: impl IntoIterator<Item = InstId>) -> Self {
        Provenance::Tracked(allocas.into_iter().collect())
    }

    pub fn external() -> Self {
        Self::from_kind(ProvenanceKind::External)
    }

    pub fn kind(&self) -> ProvenanceKind {
        match self {
            Provenance::Tracked(_) => ProvenanceKind::Tracked,
            Provenance::External(_) => ProvenanceKind::External,
            Provenance::Wildcard => ProvenanceKind::Wildcard,
        }
    }

    pub fn allocas(&self) -> &AllocaSet {
        static EMPTY: AllocaSet = AllocaSet::new();
        match self {
            Provenance::Tracked(set) | Provenance::External(set) => set,
            Provenance::Wildcard => &EMPTY,
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Provenance::Tracked(set) if set.is_empty())
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Provenance::Wildcard)
    }

    pub fn may_alias(&self, alloca: InstId) -> bool {
        self.is_top() || self.allocas().contains(&alloca)
    }

    /// Joins `other` into `self`. Returns whether `self` changed.
    pub fn merge(&mut self, other: &Provenance) -> bool {
        let kind = self.kind().max(other.kind());

        if kind == ProvenanceKind::Wildcard {
            if self.is_top() {
                return false;
            }
            *self = Provenance::Wildcard;
            return true;
        }

        let mut changed = kind != self.kind();
        let mut set = match std::mem::take(self) {
            Provenance::Tracked(set) | Provenance::External(set) => set,
            Provenance::Wildcard => AllocaSet::new(),
        };
        for &alloca in other.allocas() {
            changed |= set.insert(alloca);
        }

        *self = match kind {
            ProvenanceKind::External => Provenance::External(set),
            _ => Provenance::Tracked(set),
        };
        changed
    }

    pub fn display<'a>(&'a self, function: &'a Function) -> ProvenanceDisplay<'a> {
        ProvenanceDisplay {
            provenance: self,
            function,
        }
    }
}

pub struct ProvenanceDisplay<'a> {
    provenance: &'a Provenance,
    function: &'a Function,
}

impl fmt::Display for ProvenanceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.provenance.is_top() {
            return write!(f, "*");
        }

        write!(f, "{}", format_alloca_list(self.function, self.provenance.allocas()))?;
        if self.provenance.kind() == ProvenanceKind::External {
            write!(f, "+")?;
        }
        Ok(())
    }
}

pub(crate) fn format_alloca_list<'a>(
    function: &Function,
    allocas: impl IntoIterator<Item = &'a InstId>,
) -> String {
    let names: Vec<String> = allocas
        .into_iter()
        .map(|&id| format_inst_ref(function, id))
        .collect();
    format!("[{}]", names.join(", "))
}
