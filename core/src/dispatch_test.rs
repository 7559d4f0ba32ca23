#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;

    use crate::dispatch::{Versioned, versioned};
    use crate::error::VersionError;
    use crate::identity::Identity;
    use crate::registry::{self, Registry};

    fn fresh() -> Arc<Registry> {
        Arc::new(Registry::new())
    }

    #[test]
    fn test_original_runs_without_variants() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |x: i64| x * 10)?;
        assert_eq!(foo.call(4)?, 40);
        Ok(())
    }

    #[test]
    fn test_identity_derivation_at_registration() -> Result<()> {
        let registry = fresh();
        let method = Versioned::register(registry.clone(), "pkg::geometry", "Matrix::multiply", |x: i64| x)?;
        assert_eq!(method.identity().as_str(), "Matrix::multiply");

        let free = Versioned::register(registry, "pkg::geometry", "normalize", |x: i64| x)?;
        assert_eq!(free.identity().as_str(), "geometry::normalize");
        Ok(())
    }

    #[test]
    fn test_declared_default_wins_over_original() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |()| 0)?;
        foo.variant("foo_v1", |()| 1)?;
        foo.variant("foo_v2", |()| 2)?;
        foo.set_default("v1")?;
        assert_eq!(foo.call(())?, 1);
        Ok(())
    }

    #[test]
    fn test_default_variant_one_step() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |()| 0)?;
        let vref = foo.default_variant("foo_v1", |()| 1)?;
        assert_eq!(vref.version(), "v1");
        assert_eq!(foo.call(())?, 1);
        Ok(())
    }

    #[test]
    fn test_variant_name_derivation() -> Result<()> {
        let registry = fresh();
        let algo = Versioned::register(registry, "tests::disp", "barAlgo", |(a, b): (i64, i64)| a + b)?;
        let vref = algo.variant("barAlgoV1", |(a, b)| a + b + 1)?;
        assert_eq!(vref.identity().as_str(), "disp::barAlgo");
        assert_eq!(vref.version(), "V1");
        Ok(())
    }

    #[test]
    fn test_foreign_prefix_rejected() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |()| 0)?;
        let err = foo.variant("quux_v1", |()| 1).unwrap_err();
        assert!(matches!(err, VersionError::NamingConvention { .. }));
        Ok(())
    }

    #[test]
    fn test_pin_changes_resolution() -> Result<()> {
        let registry = fresh();
        let algo = Versioned::register(registry.clone(), "tests::disp", "barAlgo", |(a, b): (i64, i64)| a + b)?;
        algo.variant("barAlgoV1", |(a, b)| a + b + 1)?;
        algo.variant("barAlgoV2", |(a, b)| a + b + 2)?;
        let id = algo.identity().clone();

        assert_eq!(algo.call((1, 1))?, 2);
        registry.pin(&id, Some("V1"))?;
        assert_eq!(algo.call((1, 1))?, 3);
        registry.pin(&id, Some("V2"))?;
        assert_eq!(algo.call((1, 1))?, 4);
        registry.pin(&id, None)?;
        assert_eq!(algo.call((1, 1))?, 2);
        Ok(())
    }

    #[test]
    fn test_pin_bare_name_selects_original() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry.clone(), "tests::disp", "foo", |()| 0)?;
        foo.default_variant("foo_v1", |()| 1)?;
        registry.pin(foo.identity(), Some("foo"))?;
        assert_eq!(foo.call(())?, 0);
        Ok(())
    }

    #[test]
    fn test_duplicate_registration_keeps_first() -> Result<()> {
        let registry = fresh();
        let first = Versioned::register(registry.clone(), "tests::disp", "foo", |x: i64| x + 1)?;
        let err = Versioned::register(registry.clone(), "tests::disp", "foo", |x: i64| x + 2).unwrap_err();
        assert_eq!(err, VersionError::DuplicateRegistration(Identity::new("disp::foo")));
        // the first registration keeps working and stays queryable
        assert_eq!(first.call(1)?, 2);
        assert!(registry.contains(first.identity()));
        Ok(())
    }

    #[test]
    fn test_unknown_default_rejected() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |()| 0)?;
        let err = foo.set_default("xyz").unwrap_err();
        assert_eq!(err.to_string(), "version xyz not defined for disp::foo");
        Ok(())
    }

    #[test]
    fn test_variant_failure_passes_through() -> Result<()> {
        let registry = fresh();
        let parse = Versioned::register(registry, "tests::disp", "parse", |s: &'static str| {
            s.parse::<i64>().map_err(|e| e.to_string())
        })?;
        parse.variant_named("strict", |_s| Err("rejected".to_string()))?;
        parse.set_default("strict")?;

        // dispatch succeeded; the variant's own error comes back unwrapped
        assert_eq!(parse.call("42")?, Err("rejected".to_string()));
        Ok(())
    }

    #[test]
    fn test_resolution_is_idempotent() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |()| 0)?;
        foo.default_variant("foo_v1", |()| 1)?;
        for _ in 0..16 {
            assert_eq!(foo.call(())?, 1);
        }
        Ok(())
    }

    #[test]
    fn test_clone_shares_variant_set() -> Result<()> {
        let registry = fresh();
        let foo = Versioned::register(registry, "tests::disp", "foo", |()| 0)?;
        let alias = foo.clone();
        foo.default_variant("foo_v1", |()| 1)?;
        assert_eq!(alias.call(())?, 1);
        Ok(())
    }

    #[test]
    fn test_global_registry_convenience() -> Result<()> {
        let foo = versioned("tests::disp_global", "uniquely_named_algo", |x: i64| x - 1)?;
        assert_eq!(foo.call(10)?, 9);
        assert!(registry::global().contains(&Identity::new("disp_global::uniquely_named_algo")));
        Ok(())
    }
}
