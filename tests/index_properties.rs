//! Property-based tests for chain parsing and biased position lookups

use proptest::prelude::*;
use tbl_transfer::core::{parse_chain_bytes, Bias, ChainIndex};

/// Two-block chain on the plus strand, returned with its layout
#[derive(Debug, Clone)]
struct TwoBlocks {
    ref_start: u64,
    alt_start: u64,
    first: u64,
    ref_gap: u64,
    alt_gap: u64,
    second: u64,
}

impl TwoBlocks {
    fn chain_text(&self) -> String {
        let ref_end = self.ref_start + self.first + self.ref_gap + self.second;
        let alt_end = self.alt_start + self.first + self.alt_gap + self.second;
        format!(
            "chain 1000 r {} + {} {} a {} + {} {} 1\n{} {} {}\n{}\n",
            ref_end + 10,
            self.ref_start,
            ref_end,
            alt_end + 10,
            self.alt_start,
            alt_end,
            self.first,
            self.ref_gap,
            self.alt_gap,
            self.second
        )
    }

    fn index(&self) -> ChainIndex {
        ChainIndex::from_chain_data(parse_chain_bytes(self.chain_text().as_bytes()).unwrap())
    }
}

fn arb_two_blocks() -> impl Strategy<Value = TwoBlocks> {
    (0u64..500, 0u64..500, 1u64..300, 1u64..100, 0u64..100, 1u64..300).prop_map(
        |(ref_start, alt_start, first, ref_gap, alt_gap, second)| TwoBlocks {
            ref_start,
            alt_start,
            first,
            ref_gap,
            alt_gap,
            second,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: aligned positions map by block offset regardless of bias
    #[test]
    fn prop_aligned_positions_map_by_offset(layout in arb_two_blocks(), offset in 0u64..300) {
        let index = layout.index();
        prop_assume!(offset < layout.first);
        let pos = layout.ref_start + offset + 1;
        let expected = layout.alt_start + offset + 1;
        prop_assert_eq!(index.translate("r", "a", pos, Bias::RoundDown), Some(expected));
        prop_assert_eq!(index.translate("r", "a", pos, Bias::RoundUp), Some(expected));
    }

    /// Property: gap positions round to the flanking aligned bases
    #[test]
    fn prop_gap_positions_round_to_flanks(layout in arb_two_blocks(), offset in 0u64..100) {
        let index = layout.index();
        prop_assume!(offset < layout.ref_gap);
        let pos = layout.ref_start + layout.first + offset + 1;

        let last_of_first = layout.alt_start + layout.first;
        let first_of_second = layout.alt_start + layout.first + layout.alt_gap + 1;
        prop_assert_eq!(index.translate("r", "a", pos, Bias::RoundDown), Some(last_of_first));
        prop_assert_eq!(index.translate("r", "a", pos, Bias::RoundUp), Some(first_of_second));
    }

    /// Property: positions beyond the aligned span are unmapped whatever the bias
    #[test]
    fn prop_outside_positions_are_unmapped(layout in arb_two_blocks(), beyond in 1u64..50) {
        let index = layout.index();
        let ref_end = layout.ref_start + layout.first + layout.ref_gap + layout.second;

        for bias in [Bias::RoundDown, Bias::RoundUp] {
            prop_assert_eq!(index.translate("r", "a", ref_end + beyond, bias), None);
            if layout.ref_start >= beyond {
                let before = layout.ref_start - beyond + 1;
                prop_assert_eq!(index.translate("r", "a", before, bias), None);
            }
        }

        // The span boundaries themselves are aligned bases
        prop_assert_eq!(
            index.translate("r", "a", layout.ref_start + 1, Bias::RoundUp),
            Some(layout.alt_start + 1)
        );
        prop_assert!(index.translate("r", "a", ref_end, Bias::RoundDown).is_some());
    }

    /// Property: a minus-strand alternate block maps backwards from its far end
    #[test]
    fn prop_minus_strand_block_runs_backwards(
        ref_start in 0u64..100,
        alt_start in 0u64..100,
        len in 1u64..200,
        extra in 0u64..100,
        offset in 0u64..200,
    ) {
        prop_assume!(offset < len);
        let alt_size = alt_start + len + extra;
        let text = format!(
            "chain 1 r {} + {} {} a {} - {} {} 1\n{}\n",
            ref_start + len + 5,
            ref_start,
            ref_start + len,
            alt_size,
            alt_start,
            alt_start + len,
            len
        );
        let index = ChainIndex::from_chain_data(parse_chain_bytes(text.as_bytes()).unwrap());
        prop_assert_eq!(
            index.translate("r", "a", ref_start + offset + 1, Bias::RoundUp),
            Some(alt_size - alt_start - offset)
        );
    }

    /// Property: on a plus-strand chain, lookups never decrease along the reference
    #[test]
    fn prop_round_down_is_monotonic(layout in arb_two_blocks()) {
        let index = layout.index();
        let ref_end = layout.ref_start + layout.first + layout.ref_gap + layout.second;
        let mut previous = 0;
        for pos in 1..=ref_end + 5 {
            if let Some(mapped) = index.translate("r", "a", pos, Bias::RoundDown) {
                prop_assert!(mapped >= previous);
                previous = mapped;
            }
        }
    }
}

#[test]
fn test_position_zero_is_unmapped() {
    let layout = TwoBlocks {
        ref_start: 0,
        alt_start: 0,
        first: 10,
        ref_gap: 5,
        alt_gap: 0,
        second: 10,
    };
    let index = layout.index();
    assert_eq!(index.translate("r", "a", 0, Bias::RoundUp), None);
    assert_eq!(index.translate("r", "a", 1, Bias::RoundUp), Some(1));
}

#[test]
fn test_malformed_chain_rejected() {
    assert!(parse_chain_bytes(b"chain 1 r 10 + 0 10\n").is_err());
    assert!(parse_chain_bytes(b"10\n").is_err());
    assert!(parse_chain_bytes(b"chain 1 r 10 + 0 10 a 10 + 0 10 1\n20\n").is_err());
}
