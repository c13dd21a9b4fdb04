//! Pure selection logic: which office to target, which slot to accept.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::page::{Office, Slot};

/// Pick the nearest routable office that has not been rejected in the
/// current attempt.
///
/// Offices missing from `distances` are unroutable and excluded. Ties
/// on distance go to the office listed first by the server, so the
/// choice is deterministic for a given offered list. Returns `None`
/// when every offered office is rejected or unroutable, which the
/// caller treats as attempt-level exhaustion.
pub fn select_office<'a>(
    offered: &'a [Office],
    rejected: &HashSet<String>,
    distances: &HashMap<String, u32>,
) -> Option<&'a Office> {
    offered
        .iter()
        .filter(|office| !rejected.contains(&office.id))
        .filter_map(|office| distances.get(&office.name).map(|d| (office, *d)))
        .min_by_key(|(_, distance)| *distance)
        .map(|(office, _)| office)
}

/// Pick the first offered slot dated on or before `deadline`.
///
/// Relies on the server listing slots earliest-first; slots are scanned
/// in offered order and not re-sorted. Returns `None` when no slot
/// meets the deadline, which the caller treats the same as an empty
/// offer (office-level failure).
pub fn select_slot<'a>(offered: &'a [Slot], deadline: NaiveDate) -> Option<&'a Slot> {
    offered.iter().find(|slot| slot.date <= deadline)
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;
