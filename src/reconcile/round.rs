use std::collections::HashMap;

use serde::Serialize;

use crate::form::form_model::{Attachment, FieldId, FieldSet};
use crate::reconcile::error::FormError;
use crate::reconcile::identity::{IdMapping, IdMinter, UsedIdentifiers, reconcile};
use crate::reconcile::rewrite::rewrite_field_set;

/// A condition pointing at an id that no field in the reconciled set carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanglingReference {
    /// Field owning the condition.
    pub field: FieldId,
    pub attachment: Attachment,
    /// The unresolved id.
    pub target: FieldId,
}

#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    pub mapping: IdMapping,
    /// Ids minted this round, in field order.
    pub minted: Vec<FieldId>,
    /// Ids carried over from earlier rounds, in field order.
    pub carried: Vec<FieldId>,
    pub dangling: Vec<DanglingReference>,
    /// Fields carrying option groups although their type shows no choices.
    pub stray_options: Vec<FieldId>,
}

impl RoundReport {
    pub fn has_warnings(&self) -> bool {
        !self.dangling.is_empty() || !self.stray_options.is_empty()
    }
}

/// Result of a successful round: the canonical field-set plus what happened.
#[derive(Debug, Clone)]
pub struct ReconciledForm {
    pub fields: FieldSet,
    pub used: UsedIdentifiers,
    pub report: RoundReport,
}

/// Run one reconciliation round against a snapshot of `used`.
///
/// Nothing outside the returned value is modified, so a failed round leaves
/// the caller's state as it was.
pub fn reconcile_round(
    mut fields: FieldSet,
    used: &UsedIdentifiers,
    minter: &mut dyn IdMinter,
) -> Result<ReconciledForm, FormError> {
    let mut working = used.clone();
    let input_ids: Vec<FieldId> = fields.ids().cloned().collect();

    let mapping = reconcile(&mut fields, &mut working, minter);
    rewrite_field_set(&mut fields, &mapping);

    check_unique(&fields)?;

    let mut minted = Vec::new();
    let mut carried = Vec::new();
    for (old, field) in input_ids.iter().zip(fields.iter()) {
        if used.contains(old) {
            carried.push(field.id.clone());
        } else if !minted.contains(&field.id) {
            minted.push(field.id.clone());
        }
    }

    let dangling = find_dangling(&fields);
    let stray_options = find_stray_options(&fields);

    Ok(ReconciledForm {
        fields,
        used: working,
        report: RoundReport {
            mapping,
            minted,
            carried,
            dangling,
            stray_options,
        },
    })
}

fn check_unique(fields: &FieldSet) -> Result<(), FormError> {
    let mut seen: HashMap<&FieldId, usize> = HashMap::new();
    for (index, field) in fields.iter().enumerate() {
        if let Some(&first) = seen.get(&field.id) {
            return Err(FormError::IdentifierCollision {
                id: field.id.clone(),
                first,
                second: index,
            });
        }
        seen.insert(&field.id, index);
    }
    Ok(())
}

/// Every rule target, at either attachment point, that no field carries.
pub fn find_dangling(fields: &FieldSet) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();

    for field in fields.iter() {
        for (attachment, condition) in field.conditions() {
            for target in condition.targets() {
                if fields.get(target).is_none() {
                    dangling.push(DanglingReference {
                        field: field.id.clone(),
                        attachment,
                        target: target.clone(),
                    });
                }
            }
        }
    }

    dangling
}

/// Non-choice fields (text, number, ...) that still carry option groups.
pub fn find_stray_options(fields: &FieldSet) -> Vec<FieldId> {
    fields
        .iter()
        .filter(|f| !f.option_groups.is_empty() && !f.is_choice())
        .map(|f| f.id.clone())
        .collect()
}
