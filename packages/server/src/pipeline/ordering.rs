//! Collection-level ordering and featured-flag logic.
//!
//! Multi-row writes are not atomic, so rows read back may carry duplicate
//! `sort_order` values or zero/several featured flags. Everything here is
//! deterministic over whatever was persisted.

use std::collections::HashSet;

use uuid::Uuid;

use super::model::Asset;

/// Highest `sort_order` a caller may request. Leaves room for positions
/// assigned after it and for shifting rows down on insert.
pub const MAX_SORT_ORDER: i32 = 1_000_000;

/// Order assets for display: by `sort_order`, ties keep the order the store
/// returned them in.
pub fn arrange(mut assets: Vec<Asset>) -> Vec<Asset> {
    // `sort_by_key` is stable.
    assets.sort_by_key(|a| a.sort_order);
    assets
}

/// The asset that displays as featured: the first flagged one in display order.
pub fn effective_featured(arranged: &[Asset]) -> Option<&Asset> {
    arranged.iter().find(|a| a.is_featured)
}

/// Check that `requested` is exactly a permutation of the owner's asset ids.
pub fn validate_permutation(current: &[Asset], requested: &[Uuid]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(*id) {
            return Err(format!("Duplicate asset {id} in reorder list"));
        }
    }

    let existing: HashSet<Uuid> = current.iter().map(|a| a.id).collect();
    if let Some(foreign) = requested.iter().find(|id| !existing.contains(id)) {
        return Err(format!("Asset {foreign} does not belong to this owner"));
    }
    if let Some(missing) = current.iter().find(|a| !seen.contains(&a.id)) {
        return Err(format!("Reorder list is missing asset {}", missing.id));
    }
    Ok(())
}

/// `sort_order` writes that make `ids` display in the given sequence.
///
/// Positions are array indexes; rows already at their index are skipped.
pub fn reorder_plan(current: &[Asset], ids: &[Uuid]) -> Vec<(Uuid, i32)> {
    ids.iter()
        .enumerate()
        .filter_map(|(index, id)| {
            let position = i32::try_from(index).ok()?;
            let asset = current.iter().find(|a| a.id == *id)?;
            (asset.sort_order != position).then_some((*id, position))
        })
        .collect()
}

/// `sort_order` writes that free `position` for a new asset: every asset at
/// or after it moves down one place. Empty when the position is free.
///
/// Writes run from the back so no intermediate state has a new tie.
pub fn insert_at_plan(arranged: &[Asset], position: i32) -> Result<Vec<(Uuid, i32)>, String> {
    if !arranged.iter().any(|a| a.sort_order == position) {
        return Ok(Vec::new());
    }
    arranged
        .iter()
        .rev()
        .filter(|a| a.sort_order >= position)
        .map(|a| {
            a.sort_order
                .checked_add(1)
                .map(|order| (a.id, order))
                .ok_or_else(|| format!("Asset {} cannot move past sort order {}", a.id, a.sort_order))
        })
        .collect()
}

/// Featured-flag writes that leave exactly one featured asset (or, when
/// `require_one` is false, at most one).
///
/// The first featured asset in display order keeps its flag; with none and
/// `require_one`, the first asset is promoted.
pub fn featured_plan(arranged: &[Asset], require_one: bool) -> Vec<(Uuid, bool)> {
    let keep = match effective_featured(arranged) {
        Some(asset) => Some(asset.id),
        None if require_one => arranged.first().map(|a| a.id),
        None => None,
    };

    arranged
        .iter()
        .filter_map(|a| {
            let want = Some(a.id) == keep;
            (a.is_featured != want).then_some((a.id, want))
        })
        .collect()
}

/// Featured-flag writes that make `target` the only featured asset.
pub fn feature_plan(current: &[Asset], target: Uuid) -> Vec<(Uuid, bool)> {
    // Target first, so an interruption leaves two featured rather than none.
    let mut plan: Vec<(Uuid, bool)> = current
        .iter()
        .filter(|a| a.id == target && !a.is_featured)
        .map(|a| (a.id, true))
        .collect();
    plan.extend(
        current
            .iter()
            .filter(|a| a.id != target && a.is_featured)
            .map(|a| (a.id, false)),
    );
    plan
}
