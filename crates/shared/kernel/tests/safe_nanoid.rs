use accounts_kernel::{SAFE_ALPHABET, safe_nanoid};

#[test]
fn default_ids_use_the_safe_alphabet() {
    let id = safe_nanoid!();
    assert_eq!(id.len(), 12);
    assert!(id.chars().all(|ch| SAFE_ALPHABET.contains(&ch)), "unexpected character in {id}");
}

#[test]
fn ids_honour_requested_length() {
    assert_eq!(safe_nanoid!(24).len(), 24);
    assert_ne!(safe_nanoid!(), safe_nanoid!());
}
