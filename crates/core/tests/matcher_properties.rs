//! Property tests for deterministic matching.

use proptest::prelude::*;
use std::sync::Arc;
use voxtap_core::*;

fn registry(size: u32) -> TargetRegistry {
    let entries = (1..=size)
        .map(|id| TargetEntry {
            id,
            label: format!("앱{}호", id),
            x: id as i32 * 10,
            y: 400,
            url: None,
        })
        .collect();
    TargetRegistry::new(entries).unwrap()
}

fn matcher(size: u32) -> DeterministicMatcher {
    DeterministicMatcher::new(Arc::new(registry(size)), OrdinalRule::default())
}

proptest! {
    #[test]
    fn registered_ordinal_resolves_to_its_entry(
        id in 1u32..=24,
        prefix in "[가-힣 ]{0,8}",
        suffix in "[가-힣 ]{0,8}",
    ) {
        let registry = registry(24);
        let matcher = DeterministicMatcher::new(Arc::new(registry.clone()), OrdinalRule::default());
        let text = format!("{}{}번{}", prefix, id, suffix);

        let outcome = matcher.match_text(&text);
        prop_assert_eq!(outcome.clone(), MatchOutcome::Matched(SymbolicTarget::Id(id)));

        let command = Command::new(text).unwrap();
        let entry = registry.lookup_by_id(id).unwrap();
        prop_assert_eq!(
            registry.resolve(&SymbolicTarget::Id(id), &command),
            Some(ActionDescriptor::Tap { x: entry.x, y: entry.y })
        );
    }

    #[test]
    fn first_registered_label_wins(
        picks in prop::collection::vec(1u32..=10, 1..4),
        filler in "[a-z ]{0,6}",
    ) {
        // Labels from the picks appear in the text in arbitrary order; the
        // lowest id (earliest in registry order) must win.
        let text = picks
            .iter()
            .map(|id| format!("앱{}호", id))
            .collect::<Vec<_>>()
            .join(&filler);
        let expected = *picks.iter().min().unwrap();

        prop_assert_eq!(
            matcher(10).match_text(&text),
            MatchOutcome::Matched(SymbolicTarget::Label(format!("앱{}호", expected)))
        );
    }

    #[test]
    fn text_without_ordinals_or_labels_is_unmatched(text in "[a-z ]{0,20}") {
        prop_assert_eq!(matcher(10).match_text(&text), MatchOutcome::Unmatched);
    }

    #[test]
    fn out_of_range_ordinals_never_match(n in 25u32..10_000) {
        prop_assert_eq!(OrdinalRule::default().extract(&format!("{}번", n)), None);
    }
}
