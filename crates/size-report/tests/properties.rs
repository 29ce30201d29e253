//! Properties of the extractor and the usage formatter.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::arithmetic_side_effects,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use proptest::prelude::*;
use size_report::{calculate_size, filled_cells, format_usage, ItcmLayout, SectionPattern, BAR_CELLS};

fn data_pattern() -> SectionPattern {
    SectionPattern::new(r"^\.data\s+([0-9]+).*").unwrap()
}

proptest! {
    #[test]
    fn bar_is_always_ten_cells(used in 0_u64..10_000_000, total in 1_u64..10_000_000) {
        let line = format_usage(used, total);
        let bar_end = line.find(']').unwrap();
        prop_assert_eq!(bar_end, BAR_CELLS + 1);
        prop_assert!(filled_cells(used, total) <= BAR_CELLS);
        let suffix = format!("(used {used} bytes from {total} bytes)");
        prop_assert!(line.ends_with(&suffix));
    }

    #[test]
    fn bar_and_percent_follow_the_ratio(used in 0_u64..20_000_000, total in 1_u64..10_000_000) {
        let ratio = used as f64 / total as f64;
        let cells = (ratio * 10.0).round_ties_even().min(10.0) as usize;
        prop_assert_eq!(filled_cells(used, total), cells);

        let line = format_usage(used, total);
        let (bar, rest) = line.split_once("] ").unwrap();
        prop_assert_eq!(bar.matches('=').count(), cells);
        let (pct, _) = rest.split_once(" (used").unwrap();
        prop_assert_eq!(pct.trim_start(), format!("{:.1}%", ratio * 100.0));
    }

    #[test]
    fn fully_used_is_a_full_bar_at_one_hundred_percent(total in 1_u64..u64::MAX) {
        prop_assert_eq!(filled_cells(total, total), BAR_CELLS);
        prop_assert!(format_usage(total, total).starts_with("[==========]  100.0%"));
    }

    #[test]
    fn over_budget_is_full(total in 1_u64..1_000_000, extra in 0_u64..1_000_000) {
        prop_assert_eq!(filled_cells(total + extra, total), BAR_CELLS);
    }

    #[test]
    fn nothing_used_is_empty(total in 1_u64..u64::MAX) {
        prop_assert_eq!(filled_cells(0, total), 0);
        prop_assert!(format_usage(0, total).contains("   0.0% "));
    }

    #[test]
    fn bar_grows_with_usage(a in 0_u64..100_000, b in 0_u64..100_000, total in 1_u64..100_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(filled_cells(lo, total) <= filled_cells(hi, total));
    }

    #[test]
    fn extraction_ignores_line_order(sizes in prop::collection::vec(0_u64..1_000_000, 0..20)) {
        let mut lines: Vec<String> = sizes.iter().map(|s| format!(".data {s} 0")).collect();
        lines.push(".bss 77 0".to_owned());
        let forward = lines.join("\n");
        lines.reverse();
        let backward = lines.join("\n");

        let p = data_pattern();
        let expected: u64 = sizes.iter().sum();
        prop_assert_eq!(calculate_size(Some(&forward), Some(&p)).unwrap(), Some(expected));
        prop_assert_eq!(calculate_size(Some(&backward), Some(&p)).unwrap(), Some(expected));
    }

    #[test]
    fn blank_output_is_unavailable(ws in "[ \t\n]{0,16}") {
        prop_assert_eq!(calculate_size(Some(&ws), Some(&data_pattern())).unwrap(), None);
    }

    #[test]
    fn itcm_padding_fills_the_last_block(used in 0_u64..10_000_000) {
        let layout = ItcmLayout::new(used);
        prop_assert_eq!(layout.allocated % 32_768, 0);
        prop_assert!(layout.allocated >= used);
        prop_assert!(layout.padding < 32_768);
        prop_assert_eq!(layout.used + layout.padding, layout.allocated);
    }
}
