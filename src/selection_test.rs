// Unit tests for office and slot selection

use super::*;
use crate::applicant::parse_date;
use pretty_assertions::assert_eq;

fn office(id: &str, name: &str) -> Office {
    Office {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn slot(id: &str, date: &str) -> Slot {
    Slot {
        id: id.to_string(),
        date: parse_date(date, "slot date").unwrap(),
    }
}

#[test]
fn picks_nearest_routable_office() {
    // A has no route, B is 5000m, C is 3000m
    let offered = vec![office("1", "A"), office("2", "B"), office("3", "C")];
    let distances: HashMap<String, u32> =
        [("B".to_string(), 5000), ("C".to_string(), 3000)].into();
    let mut rejected = HashSet::new();

    let first = select_office(&offered, &rejected, &distances).unwrap();
    assert_eq!(first.id, "3");

    rejected.insert(first.id.clone());
    let second = select_office(&offered, &rejected, &distances).unwrap();
    assert_eq!(second.id, "2");

    rejected.insert(second.id.clone());
    assert_eq!(select_office(&offered, &rejected, &distances), None);
}

#[test]
fn selection_is_deterministic() {
    let offered = vec![office("1", "A"), office("2", "B"), office("3", "C")];
    let distances: HashMap<String, u32> = [
        ("A".to_string(), 7000),
        ("B".to_string(), 5000),
        ("C".to_string(), 3000),
    ]
    .into();
    let rejected = HashSet::new();

    let first = select_office(&offered, &rejected, &distances).unwrap();
    for _ in 0..10 {
        assert_eq!(select_office(&offered, &rejected, &distances), Some(first));
    }
}

#[test]
fn distance_ties_break_by_offered_order() {
    let offered = vec![office("9", "FAR"), office("4", "X"), office("5", "Y")];
    let distances: HashMap<String, u32> = [
        ("FAR".to_string(), 9000),
        ("X".to_string(), 1000),
        ("Y".to_string(), 1000),
    ]
    .into();
    let rejected = HashSet::new();

    assert_eq!(
        select_office(&offered, &rejected, &distances).unwrap().id,
        "4"
    );
}

#[test]
fn rejected_office_is_never_returned_again() {
    let offered = vec![office("1", "A"), office("2", "B")];
    let distances: HashMap<String, u32> =
        [("A".to_string(), 100), ("B".to_string(), 200)].into();
    let mut rejected = HashSet::new();

    let chosen = select_office(&offered, &rejected, &distances).unwrap();
    rejected.insert(chosen.id.clone());

    let next = select_office(&offered, &rejected, &distances).unwrap();
    assert_ne!(next.id, chosen.id);
}

#[test]
fn takes_first_slot_within_deadline() {
    let offered = vec![slot("101", "01/09/2021"), slot("102", "10/09/2021")];
    let deadline = parse_date("05/09/2021", "deadline").unwrap();

    assert_eq!(select_slot(&offered, deadline).unwrap().id, "101");
}

#[test]
fn never_returns_slot_after_deadline() {
    let offered = vec![slot("101", "10/09/2021"), slot("102", "20/09/2021")];
    let deadline = parse_date("05/09/2021", "deadline").unwrap();

    assert_eq!(select_slot(&offered, deadline), None);
}

#[test]
fn deadline_is_inclusive() {
    let offered = vec![slot("101", "05/09/2021")];
    let deadline = parse_date("05/09/2021", "deadline").unwrap();

    assert_eq!(select_slot(&offered, deadline).unwrap().id, "101");
}

#[test]
fn empty_offer_yields_none() {
    let deadline = parse_date("05/09/2021", "deadline").unwrap();
    assert_eq!(select_slot(&[], deadline), None);
}
