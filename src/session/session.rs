use crate::form::form_model::FieldSet;
use crate::reconcile::error::FormError;
use crate::reconcile::identity::{IdMinter, UsedIdentifiers, UuidMinter};
use crate::reconcile::round::{RoundReport, reconcile_round};

/// State carried across edit requests: the last reconciled form and every id
/// handed out so far. Created empty, dropped at exit.
pub struct FormSession {
    previous: Option<FieldSet>,
    used: UsedIdentifiers,
    minter: Box<dyn IdMinter>,
    rounds: u64,
}

impl FormSession {
    pub fn new() -> Self {
        Self::with_minter(Box::new(UuidMinter))
    }

    pub fn with_minter(minter: Box<dyn IdMinter>) -> Self {
        FormSession {
            previous: None,
            used: UsedIdentifiers::new(),
            minter,
            rounds: 0,
        }
    }

    /// Adopt an already-reconciled form, e.g. one loaded from disk.
    /// Its ids are registered so the next round treats them as carried over.
    pub fn seed(&mut self, form: FieldSet) {
        for id in form.ids() {
            self.used.insert(id.clone());
        }
        self.previous = Some(form);
    }

    /// Run one round. On failure the session is left untouched.
    pub fn apply(&mut self, candidate: FieldSet) -> Result<RoundReport, FormError> {
        let reconciled = reconcile_round(candidate, &self.used, self.minter.as_mut())?;

        self.used = reconciled.used;
        self.previous = Some(reconciled.fields);
        self.rounds += 1;

        Ok(reconciled.report)
    }

    pub fn current(&self) -> Option<&FieldSet> {
        self.previous.as_ref()
    }

    pub fn used(&self) -> &UsedIdentifiers {
        &self.used
    }

    /// Successful rounds so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}
