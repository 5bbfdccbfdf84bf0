/// Property-based tests for password hashing using proptest
///
/// Argon2 is deliberately slow, so the case count is kept small and the cost
/// parameters are set to their minimum.
use argon2::Params;
use gatehouse::auth::PasswordHasher;
use proptest::prelude::*;

fn hasher() -> PasswordHasher {
    let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
    PasswordHasher::with_params("proptest_pepper", params)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_verify_accepts_own_hash(password in "\\PC{0,64}") {
        let hasher = hasher();
        let hash = hasher.hash(&password).unwrap();
        prop_assert!(hasher.verify(&password, &hash));
    }

    #[test]
    fn test_hash_is_non_deterministic(password in "\\PC{1,64}") {
        let hasher = hasher();
        let first = hasher.hash(&password).unwrap();
        let second = hasher.hash(&password).unwrap();
        prop_assert_ne!(first, second);
    }

    #[test]
    fn test_verify_rejects_other_password(
        correct in "[a-zA-Z0-9]{1,32}",
        wrong in "[a-zA-Z0-9]{1,32}",
    ) {
        prop_assume!(correct != wrong);
        let hasher = hasher();
        let hash = hasher.hash(&correct).unwrap();
        prop_assert!(!hasher.verify(&wrong, &hash));
    }
}
