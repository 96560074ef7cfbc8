use std::collections::{BTreeMap, HashSet};

use crate::form::form_model::{FieldId, FieldSet};

/// Every identifier committed so far in the session. Grows monotonically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsedIdentifiers {
    ids: HashSet<FieldId>,
}

impl UsedIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already registered.
    pub fn insert(&mut self, id: FieldId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<I: Into<FieldId>> FromIterator<I> for UsedIdentifiers {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        UsedIdentifiers {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Minting
// ============================================================================

/// Source of fresh identifiers.
pub trait IdMinter {
    fn mint(&mut self) -> FieldId;
}

/// Random UUIDv4 strings (122 random bits).
#[derive(Debug, Default)]
pub struct UuidMinter;

impl IdMinter for UuidMinter {
    fn mint(&mut self) -> FieldId {
        FieldId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic `<prefix>-1`, `<prefix>-2`, ... ids for tests and offline replays.
#[derive(Debug)]
pub struct SequenceMinter {
    prefix: String,
    next: u64,
}

impl SequenceMinter {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 1,
        }
    }
}

impl IdMinter for SequenceMinter {
    fn mint(&mut self) -> FieldId {
        let id = FieldId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// Mint until the candidate is unused. Registers the result.
fn mint_unused(minter: &mut dyn IdMinter, used: &mut UsedIdentifiers) -> FieldId {
    loop {
        let candidate = minter.mint();
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Old identifier -> identifier after reconciliation. Total over the input ids.
pub type IdMapping = BTreeMap<FieldId, FieldId>;

/// Give every unregistered field a fresh identifier, keep registered ones.
///
/// Mutates `fields` and `used` in place. A placeholder repeated by several
/// fields maps to a single new identifier, so the round's collision check
/// sees the duplicate instead of it being silently split.
pub fn reconcile(
    fields: &mut FieldSet,
    used: &mut UsedIdentifiers,
    minter: &mut dyn IdMinter,
) -> IdMapping {
    let mut mapping = IdMapping::new();

    for field in fields.fields.iter_mut() {
        let old = field.id.clone();

        let new = match mapping.get(&old) {
            Some(already) => already.clone(),
            None if used.contains(&old) => old.clone(),
            None => mint_unused(minter, used),
        };

        mapping.insert(old, new.clone());
        field.id = new;
    }

    mapping
}
