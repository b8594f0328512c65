//! Delimited-list insertion on realistic component sources.

use text_patcher::{
    insert_into_delimited_list, insert_into_delimited_list_after, Document, PatchError, Pattern,
};

const IMPORTS: &str = r#"import React, { useState } from 'react';
import {
  Zap,
  AlertCircle,
} from 'lucide-react';
"#;

#[test]
fn test_first_list_is_used_without_anchor() {
    let doc = Document::from_text(IMPORTS);

    let result = insert_into_delimited_list(&doc, "{", "}", &["useEffect"], true).unwrap();

    assert!(result
        .document
        .as_str()
        .starts_with("import React, { useState, useEffect } from 'react';"));
}

#[test]
fn test_anchor_selects_later_list_with_trailing_comma() {
    let doc = Document::from_text(IMPORTS);
    let anchor = Pattern::regex(r"import \{\s*\n\s*Zap").unwrap();

    let result =
        insert_into_delimited_list_after(&doc, &anchor, "{", "}", &["Clock"], true).unwrap();

    assert_eq!(result.inserted, vec!["Clock".to_string()]);
    assert!(result.document.as_str().contains("  AlertCircle, Clock\n} from 'lucide-react';"));
    assert!(result.document.as_str().starts_with("import React, { useState } from 'react';"));
}

#[test]
fn test_repeated_insertion_is_idempotent() {
    let doc = Document::from_text(IMPORTS);
    let anchor = Pattern::literal("import {\n").unwrap();

    let once =
        insert_into_delimited_list_after(&doc, &anchor, "{", "}", &["Clock", "Zap"], true).unwrap();
    let twice =
        insert_into_delimited_list_after(&once.document, &anchor, "{", "}", &["Clock", "Zap"], true)
            .unwrap();

    assert!(once.changed());
    assert!(!twice.changed());
    assert_eq!(twice.document, once.document);
}

#[test]
fn test_nested_delimiters_respected() {
    let doc = Document::from_text("const cfg = { a: { b: 1 }, c: 2 };");

    let result = insert_into_delimited_list(&doc, "{", "}", &["d: 3"], true).unwrap();

    assert_eq!(result.document.as_str(), "const cfg = { a: { b: 1 }, c: 2, d: 3 };");
}

#[test]
fn test_custom_delimiters() {
    let doc = Document::from_text("const tabs = ['overview', 'payroll'];");

    let result = insert_into_delimited_list(&doc, "[", "]", &["'advances'"], true).unwrap();

    assert_eq!(
        result.document.as_str(),
        "const tabs = ['overview', 'payroll', 'advances'];"
    );
}

#[test]
fn test_missing_list_is_pattern_not_found() {
    let doc = Document::from_text("import React from 'react';\n");

    let err = insert_into_delimited_list(&doc, "{", "}", &["Clock"], true).unwrap_err();

    assert!(matches!(err, PatchError::PatternNotFound { .. }));
}

#[test]
fn test_missing_anchor_is_pattern_not_found() {
    let doc = Document::from_text(IMPORTS);
    let anchor = Pattern::literal("date-fns").unwrap();

    let err =
        insert_into_delimited_list_after(&doc, &anchor, "{", "}", &["format"], true).unwrap_err();

    match err {
        PatchError::PatternNotFound { anchor } => assert!(anchor.contains("date-fns")),
        other => panic!("unexpected error {other:?}"),
    }
}
