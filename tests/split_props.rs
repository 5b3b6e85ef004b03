//! Property tests for the prefix/suffix diff split.

use ortotrack::core::encode::split;
use proptest::prelude::*;

/// Small alphabet so generated pairs share prefixes and suffixes often
fn text() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('a'), Just('b'), Just(' '), Just('é'), Just('\u{a0}'), Just('«')], 0..12)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn split_reconstructs_both_texts(original in text(), corrected in text()) {
        let parts = split(&original, &corrected).unwrap();
        prop_assert_eq!(format!("{}{}{}", parts.prefix, parts.deleted, parts.suffix), original.clone());
        prop_assert_eq!(format!("{}{}{}", parts.prefix, parts.inserted, parts.suffix), corrected.clone());
        prop_assert!(parts.prefix.len() + parts.suffix.len() <= original.len().min(corrected.len()));
    }

    #[test]
    fn split_is_maximal(original in text(), corrected in text()) {
        let parts = split(&original, &corrected).unwrap();
        // Deleted and inserted never start (or end) with the same character
        if let (Some(a), Some(b)) = (parts.deleted.chars().next(), parts.inserted.chars().next()) {
            prop_assert_ne!(a, b);
        }
        if let (Some(a), Some(b)) = (parts.deleted.chars().last(), parts.inserted.chars().last()) {
            prop_assert_ne!(a, b);
        }
    }

    #[test]
    fn equal_texts_have_empty_edit(original in text()) {
        let parts = split(&original, &original).unwrap();
        prop_assert!(parts.deleted.is_empty() && parts.inserted.is_empty());
        prop_assert_eq!(parts.prefix, original.as_str());
    }
}
