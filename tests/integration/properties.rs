//! Properties that hold for arbitrary documents and patterns.

use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;
use text_patcher::{
    find_lines, find_lines_with_context, insert_into_delimited_list, substitute_all,
    substitute_first, write_with_backup, Document, Pattern,
};

fn line_text() -> impl Strategy<Value = String> {
    "[a-z ]{0,12}"
}

fn document_text() -> impl Strategy<Value = String> {
    prop::collection::vec(line_text(), 0..20).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn no_match_means_identity(text in document_text()) {
        let doc = Document::from_text(text.clone());
        let pattern = Pattern::literal("XYZ").unwrap();

        let first = substitute_first(&doc, &pattern, "q").unwrap();
        let all = substitute_all(&doc, &pattern, "q").unwrap();

        prop_assert_eq!(first.document.as_str(), text.as_str());
        prop_assert_eq!(all.document.as_str(), text.as_str());
        prop_assert_eq!(all.count, 0);
    }

    #[test]
    fn substitute_all_leaves_no_match(text in document_text(), needle in "[a-z]{1,3}") {
        let doc = Document::from_text(text);
        let pattern = Pattern::literal(needle).unwrap();

        let result = substitute_all(&doc, &pattern, "#").unwrap();

        prop_assert!(!pattern.is_match(result.document.as_str()));
    }

    #[test]
    fn find_lines_are_ascending_and_matching(text in document_text(), needle in "[a-z]{1,2}") {
        let doc = Document::from_text(text);
        let pattern = Pattern::literal(needle.clone()).unwrap();

        let hits: Vec<_> = find_lines(&doc, &pattern).collect();

        prop_assert!(hits.windows(2).all(|w| w[0].index < w[1].index));
        prop_assert!(hits.iter().all(|h| h.text.contains(needle.as_str())));
        let expected = doc.lines().filter(|l| l.contains(needle.as_str())).count();
        prop_assert_eq!(hits.len(), expected);
    }

    #[test]
    fn context_windows_are_clipped(
        text in document_text(),
        needle in "[a-z]{1,2}",
        radius in 0usize..5,
    ) {
        let doc = Document::from_text(text);
        let pattern = Pattern::literal(needle).unwrap();
        let line_count = doc.line_count();

        for block in find_lines_with_context(&doc, &pattern, radius) {
            prop_assert_eq!(block.start, block.matched.saturating_sub(radius));
            prop_assert_eq!(block.end(), (block.matched + radius).min(line_count - 1));
            prop_assert!(block.lines.len() <= 2 * radius + 1);
        }
    }

    #[test]
    fn list_insertion_is_idempotent(
        existing in prop::collection::vec("[A-Z][a-z]{1,6}", 0..5),
        added in prop::collection::vec("[A-Z][a-z]{1,6}", 1..4),
    ) {
        let text = format!("import {{ {} }} from 'lucide-react';", existing.join(", "));
        let doc = Document::from_text(text);

        let once = insert_into_delimited_list(&doc, "{", "}", added.as_slice(), true).unwrap();
        let twice = insert_into_delimited_list(&once.document, "{", "}", added.as_slice(), true).unwrap();

        prop_assert!(!twice.changed());
        prop_assert_eq!(twice.document.as_str(), once.document.as_str());
        for item in &added {
            prop_assert!(once.document.as_str().contains(item.as_str()));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn backup_round_trip(original in document_text(), replacement in document_text()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Module.tsx");
        fs::write(&path, &original).unwrap();

        let outcome = write_with_backup(&path, &replacement).unwrap();

        prop_assert_eq!(fs::read_to_string(&outcome.backup).unwrap(), original);
        prop_assert_eq!(fs::read_to_string(&path).unwrap(), replacement);
    }
}
