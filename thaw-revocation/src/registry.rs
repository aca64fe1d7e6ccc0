use std::collections::HashMap;

use anyhow::bail;

use thaw_database::model::actions::ActionKind;

use crate::strategy::RevocableAction;

/// Lookup from an action kind to the strategy that lifts it.
///
/// Built once at startup and only read afterwards.
#[derive(Clone, Debug)]
pub struct RevocationRegistry {
    by_kind: HashMap<ActionKind, RevocableAction>,
}

impl RevocationRegistry {
    /// Build a registry, rejecting two strategies that claim the same action kind.
    pub fn new(strategies: impl IntoIterator<Item = RevocableAction>) -> anyhow::Result<Self> {
        let mut by_kind = HashMap::new();
        for strategy in strategies {
            if let Some(existing) = by_kind.insert(strategy.applies_to(), strategy) {
                bail!(
                    "both {existing:?} and {strategy:?} revoke `{}` actions",
                    strategy.applies_to()
                );
            }
        }

        Ok(Self { by_kind })
    }

    /// Registry with every built-in strategy.
    pub fn standard() -> Self {
        Self {
            by_kind: RevocableAction::ALL
                .into_iter()
                .map(|strategy| (strategy.applies_to(), strategy))
                .collect(),
        }
    }

    /// The strategy lifting `kind`, or `None` if `kind` is never temporary.
    pub fn resolve(&self, kind: ActionKind) -> Option<RevocableAction> {
        self.by_kind.get(&kind).copied()
    }

    pub fn is_revocable(&self, kind: ActionKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    pub fn strategies(&self) -> impl Iterator<Item = RevocableAction> + '_ {
        self.by_kind.values().copied()
    }
}

impl Default for RevocationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
