//! Engine-level property tests.

use proptest::prelude::*;
use riposte::{CondOutputList, NodeKind, Rule, RuleTree};

fn tree_from_patterns(patterns: &[String]) -> RuleTree {
    let mut tree = RuleTree::new();
    for (i, pattern) in patterns.iter().enumerate() {
        let id = i as u64 + 1;
        tree.add(&Rule::new(
            id,
            [pattern.as_str()],
            CondOutputList::unconditional([format!("out {id}")]),
        ))
        .unwrap();
    }
    tree
}

/// Pattern tokens: literals, wildcards, and a capture variable.
fn pattern_strategy() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        "[a-z]{1,4}",
        Just("*".to_string()),
        Just("+".to_string()),
        Just("[x]".to_string()),
    ];
    prop::collection::vec(token, 1..5).prop_map(|tokens| tokens.join(" "))
}

proptest! {
    #[test]
    fn responses_are_deterministic(
        patterns in prop::collection::vec(pattern_strategy(), 1..5),
        input in "[a-z]{1,4}( [a-z]{1,4}){0,4}",
    ) {
        let mut tree = tree_from_patterns(&patterns);
        let first = tree.get_responses(&input);
        let second = tree.get_responses(&input);
        prop_assert_eq!(first, second);
    }

    // Also exercises termination: wildcard/variable self-loops must not
    // keep the DFS alive past the end of the input.
    #[test]
    fn scores_are_non_increasing(
        patterns in prop::collection::vec(pattern_strategy(), 1..6),
        input in "[a-z]{1,4}( [a-z]{1,4}){0,4}",
    ) {
        let mut tree = tree_from_patterns(&patterns);
        let results = tree.results(&input);
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn repeated_insertion_reuses_every_node(
        pattern in "[a-z]{1,4}( [a-z]{1,4}){0,3}",
    ) {
        let mut tree = RuleTree::new();
        tree.add(&Rule::new(1, [pattern.as_str()], CondOutputList::from("a")))
            .unwrap();
        let before = tree.node_count();

        tree.add(&Rule::new(2, [pattern.as_str()], CondOutputList::from("b")))
            .unwrap();
        prop_assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn star_subsumes_plus(prefix in "[a-z]{1,4}") {
        let mut tree = RuleTree::new();
        tree.add(&Rule::new(1, [format!("{prefix} +")], CondOutputList::from("a")))
            .unwrap();
        tree.add(&Rule::new(2, [format!("{prefix} *")], CondOutputList::from("b")))
            .unwrap();

        let wildcards: Vec<u8> = tree
            .nodes()
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Wildcard { min, .. } => Some(*min),
                _ => None,
            })
            .collect();
        prop_assert_eq!(wildcards, vec![0u8]);
    }

    #[test]
    fn variable_captures_the_whole_input(
        words in prop::collection::vec("[a-z]{1,6}", 1..6),
    ) {
        let mut tree = RuleTree::new();
        tree.add(&Rule::new(1, ["[x]"], CondOutputList::from("[x]")))
            .unwrap();

        let input = words.join(" ");
        let (responses, _) = tree.get_responses(&input);
        prop_assert_eq!(responses, vec![input]);
    }
}
