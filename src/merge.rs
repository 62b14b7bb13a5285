use std::cmp::Ordering;

use tracing::{debug, instrument};

use crate::model::{CanonicalRecord, CanonicalSet, ItemTotals};

/// Combines two canonical sets into one sorted set.
///
/// Quantities of items present in both sets are summed and rounded; items
/// present in only one set keep their own quantity. The result is ordered by
/// [`compare_items`], independent of which set came first.
#[instrument(level = "debug", skip_all, fields(left = left.len(), right = right.len()))]
pub fn merge(left: &CanonicalSet, right: &CanonicalSet) -> CanonicalSet {
    let mut totals = ItemTotals::new();
    for record in left.iter().chain(right.iter()) {
        totals.add(&record.item, record.quantity);
    }

    let merged = totals
        .into_set()
        .sorted_by(|lhs: &CanonicalRecord, rhs: &CanonicalRecord| compare_items(&lhs.item, &rhs.item));
    debug!(items = merged.len(), "canonical sets merged");
    merged
}

/// ASCII punctuation and symbols in root collation order.
const SYMBOL_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary collation classes; every character of an earlier class sorts
/// before any character of a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Symbol,
    OtherSymbol,
    Digit,
    Letter,
}

fn primary_weight(ch: char) -> (CharClass, u32) {
    if ch.is_whitespace() {
        (CharClass::Space, ch as u32)
    } else if let Some(rank) = SYMBOL_ORDER.find(ch) {
        (CharClass::Symbol, rank as u32)
    } else if ch.is_numeric() {
        (CharClass::Digit, ch.to_digit(10).unwrap_or(ch as u32))
    } else if ch.is_alphabetic() {
        (CharClass::Letter, ch as u32)
    } else {
        (CharClass::OtherSymbol, ch as u32)
    }
}

/// Locale-style ordering for item names.
///
/// The primary comparison is case-insensitive and ranks whitespace, then
/// punctuation and symbols, then digits, then letters, so `Fruit:Apple`
/// sorts before `Fruit1` and `Apple` before `banana`. Names equal at that
/// level put the lowercase form first, and anything still tied falls back
/// to code-point order so the ordering is total.
pub fn compare_items(lhs: &str, rhs: &str) -> Ordering {
    let primary = lhs
        .chars()
        .flat_map(char::to_lowercase)
        .map(primary_weight)
        .cmp(rhs.chars().flat_map(char::to_lowercase).map(primary_weight));

    primary
        .then_with(|| {
            lhs.chars()
                .map(char::is_uppercase)
                .cmp(rhs.chars().map(char::is_uppercase))
        })
        .then_with(|| lhs.cmp(rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Quantity;

    fn set(entries: &[(&str, f64)]) -> CanonicalSet {
        let mut totals = ItemTotals::new();
        for (item, quantity) in entries {
            totals.add(item, Quantity::new(*quantity));
        }
        totals.into_set()
    }

    fn items(set: &CanonicalSet) -> Vec<&str> {
        set.iter().map(|record| record.item.as_str()).collect()
    }

    #[test]
    fn shared_items_are_summed() {
        let merged = merge(&set(&[("x", 1.0)]), &set(&[("x", 2.25)]));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.records()[0].item, "x");
        assert_eq!(merged.records()[0].quantity.to_string(), "3.250");
    }

    #[test]
    fn items_sort_case_insensitively() {
        let merged = merge(&set(&[("banana", 1.0), ("Apple", 1.0)]), &set(&[("cherry", 1.0)]));
        assert_eq!(items(&merged), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn lowercase_sorts_before_uppercase_on_ties() {
        assert_eq!(compare_items("apple", "Apple"), Ordering::Less);
        assert_eq!(compare_items("Apple", "apple"), Ordering::Greater);
        assert_eq!(compare_items("Apple", "Apple"), Ordering::Equal);
        assert_eq!(compare_items("Fruit", "Fruit:Apple"), Ordering::Less);
    }

    #[test]
    fn punctuation_sorts_before_digits_and_letters() {
        assert_eq!(compare_items("Fruit:Apple", "Fruit1"), Ordering::Less);
        assert_eq!(compare_items("Fruit 2", "Fruit:Apple"), Ordering::Less);

        let merged = merge(
            &set(&[("Fruit1", 1.0), ("ab", 1.0), ("a~", 1.0)]),
            &set(&[("Fruit:Apple", 1.0), ("aB", 1.0), ("a_b", 1.0)]),
        );
        assert_eq!(
            items(&merged),
            vec!["a_b", "a~", "ab", "aB", "Fruit:Apple", "Fruit1"]
        );
    }

    #[test]
    fn merge_is_order_independent() {
        let left = set(&[("bolt", 1.5), ("Nut", 2.0)]);
        let right = set(&[("nut", 0.5), ("bolt", 0.25), ("washer", 3.0)]);

        assert_eq!(merge(&left, &right), merge(&right, &left));
        assert_eq!(items(&merge(&left, &right)), vec!["bolt", "nut", "Nut", "washer"]);
    }

    #[test]
    fn merging_empty_sets_yields_empty_set() {
        assert!(merge(&CanonicalSet::default(), &CanonicalSet::default()).is_empty());
    }

    #[test]
    fn nan_totals_survive_the_merge() {
        let merged = merge(&set(&[("x", f64::NAN)]), &set(&[("x", 1.0)]));
        assert!(merged.records()[0].quantity.is_nan());
    }
}
