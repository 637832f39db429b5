use proptest::prelude::*;
use sole_cell::SingletonRegistry;
use sole_test_utils::{spawn_callers, CallCounter};
use std::collections::HashSet;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_each_key_constructed_once(
        keys in proptest::collection::vec(0..8u8, 1..40)
    ) {
        let registry: SingletonRegistry<u8, String> = SingletonRegistry::new();
        let counter = CallCounter::new();

        let instances = spawn_callers(keys.len(), |i| {
            registry
                .get_or_construct(keys[i], |k| {
                    counter.hit();
                    Ok(format!("shape-{k}"))
                })
                .unwrap()
        });

        let unique: HashSet<u8> = keys.iter().copied().collect();
        prop_assert_eq!(counter.count(), unique.len());
        prop_assert_eq!(registry.len(), unique.len());

        // Every caller for a key sees that key's single instance
        for (key, instance) in keys.iter().zip(&instances) {
            let published = registry.get(key).unwrap();
            prop_assert!(std::sync::Arc::ptr_eq(instance, &published));
            prop_assert_eq!(instance.as_str(), format!("shape-{key}"));
        }
    }
}

#[test]
fn registry_is_owned_not_global() {
    // Two registries never share instances for the same key
    let left: SingletonRegistry<&str, u32> = SingletonRegistry::new();
    let right: SingletonRegistry<&str, u32> = SingletonRegistry::new();

    let a = left.get_or_construct("config", |_| Ok(1)).unwrap();
    let b = right.get_or_construct("config", |_| Ok(2)).unwrap();

    assert_eq!((*a, *b), (1, 2));
}
