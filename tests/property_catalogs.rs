use blockworld_gym::{ActionCatalog, ActionTerm, StateCatalog};
use proptest::prelude::*;

proptest! {
    // Indices are dense, first-seen, and invert each other
    #[test]
    fn state_catalog_round_trips(descs in proptest::collection::vec("[a-c1-3]{1,6}", 1..40)) {
        let catalog = StateCatalog::from_descriptors(descs.clone()).unwrap();
        let mut unique: Vec<String> = Vec::new();
        for d in &descs {
            if !unique.contains(d) { unique.push(d.clone()); }
        }
        prop_assert_eq!(catalog.len(), unique.len());
        for (i, d) in unique.iter().enumerate() {
            prop_assert_eq!(catalog.index_of(d).unwrap(), i);
            prop_assert_eq!(catalog.state_of(i).unwrap(), d.as_str());
        }
    }

    // name(arg,...) with the enumerated arity and order
    #[test]
    fn call_strings_are_well_formed(
        name in "[a-z][a-z_]{0,8}",
        args in proptest::collection::vec("[a-z0-9]{1,4}", 0..5),
    ) {
        let term = ActionTerm::new(name.clone(), args.clone());
        let catalog = ActionCatalog::from_terms(vec![term.clone()]).unwrap();
        let call = catalog.call_string_of(0).unwrap();
        let inner = call.strip_prefix(&format!("{name}(")).and_then(|r| r.strip_suffix(')'));
        prop_assert!(inner.is_some());
        let inner = inner.unwrap();
        let parsed: Vec<&str> = if inner.is_empty() { Vec::new() } else { inner.split(',').collect() };
        prop_assert_eq!(parsed, args.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert_eq!(catalog.index_of(&term).unwrap(), 0);
    }
}
