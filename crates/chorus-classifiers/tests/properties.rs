//! Property tests for verdict extraction and consensus resolution

use chorus_classifiers::{extract_verdict, resolve_consensus, Verdict};
use chorus_core::{ConsensusVerdict, ModelId, ModelResult};
use proptest::prelude::*;

fn vote(model: ModelId, safe: bool) -> ModelResult {
    ModelResult {
        model,
        model_name: model.display_name().to_string(),
        safe,
        concerns: Vec::new(),
        reasoning: String::new(),
    }
}

/// Case variations of a marker, e.g. "Verdict: sAfE"
fn cased(marker: &'static str) -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<bool>(), marker.len()).prop_map(move |upper| {
        marker
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
            .collect()
    })
}

/// Body lines that never contain a newline-free verdict on line one
fn body() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-zA-Z ,.:]{0,80}", 0..6)
}

const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

proptest! {
    #[test]
    fn safe_first_line_is_safe(marker in cased("VERDICT: SAFE"), lines in body(), mention in any::<bool>()) {
        let mut reply = marker;
        for line in &lines {
            reply.push('\n');
            reply.push_str(line);
        }
        if mention {
            reply.push_str("\nThis is not unsafe. VERDICT: UNSAFE");
        }
        prop_assert_eq!(extract_verdict(&reply), Verdict::Safe);
    }

    #[test]
    fn unsafe_first_line_carries_bounded_concern(marker in cased("VERDICT: UNSAFE"), lines in body()) {
        let reply = std::iter::once(marker).chain(lines.iter().cloned()).collect::<Vec<_>>().join("\n");

        let expected: String = lines.join(" ").trim().chars().take(200).collect();
        match extract_verdict(&reply) {
            Verdict::Unsafe { concern } => {
                if expected.is_empty() {
                    prop_assert_eq!(concern, None);
                } else {
                    let concern = concern.unwrap();
                    prop_assert!(concern.chars().count() <= 200);
                    prop_assert_eq!(concern, expected);
                }
            }
            other => prop_assert!(false, "expected unsafe, got {:?}", other),
        }
    }

    #[test]
    fn no_marker_is_unknown(first in "[a-zA-Z ,.]{0,60}", lines in body()) {
        prop_assume!(!first.to_uppercase().contains("VERDICT: SAFE"));
        prop_assume!(!first.to_uppercase().contains("VERDICT: UNSAFE"));

        let mut reply = first;
        for line in &lines {
            reply.push('\n');
            reply.push_str(line);
        }
        reply.push_str("\nVERDICT: SAFE");

        // A marker after the first non-blank line must not count
        if reply.trim().lines().next().map_or(true, |l| !l.to_uppercase().contains("VERDICT")) {
            prop_assert_eq!(extract_verdict(&reply), Verdict::Unknown);
        }
    }

    #[test]
    fn consensus_symmetric_under_permutation(claude in any::<bool>(), gpt5 in any::<bool>(), llama in any::<bool>()) {
        let votes = [
            vote(ModelId::Claude, claude),
            vote(ModelId::Gpt5, gpt5),
            vote(ModelId::Llama, llama),
        ];
        let baseline = resolve_consensus([&votes[0], &votes[1], &votes[2]]);
        let mut baseline_dissenters = baseline.dissenters.clone();
        baseline_dissenters.sort();

        for [a, b, c] in PERMUTATIONS {
            let record = resolve_consensus([&votes[a], &votes[b], &votes[c]]);
            prop_assert_eq!(record.verdict, baseline.verdict);
            prop_assert_eq!(record.confidence, baseline.confidence);
            prop_assert_eq!(&record.rationale, &baseline.rationale);

            let mut dissenters = record.dissenters.clone();
            dissenters.sort();
            prop_assert_eq!(&dissenters, &baseline_dissenters);
        }

        let safe_votes = [claude, gpt5, llama].iter().filter(|s| **s).count();
        prop_assert_eq!(baseline.dissenters.len(), 3 - safe_votes);
        prop_assert_eq!(baseline.verdict == ConsensusVerdict::Safe, baseline.dissenters.is_empty());
        prop_assert_eq!(baseline.verdict == ConsensusVerdict::Unsafe, baseline.dissenters.len() == 3);
    }
}
