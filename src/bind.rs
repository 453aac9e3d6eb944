//! The binding pass: map a merged [`FlatMap`] onto a typed record.
//!
//! For each leaf the binder derives the canonical key (optional
//! `<PREFIX>_`, then the accumulated nested path, then the mapped field
//! name) and looks it up exactly. No unprefixed fallback: when a prefix is
//! configured, an unprefixed key in the flat map is invisible. Absent keys
//! and empty values leave the field at its default-initialized state;
//! required-ness is the validator chain's concern, not the binder's.

use crate::coerce::{CoerceError, FromValue};
use crate::error::HotfigError;
use crate::keymap::KeyMapper;
use crate::record::{FieldMeta, FieldVisitor, Record};
use crate::value::FlatMap;

pub(crate) struct Binder<'a> {
    values: &'a FlatMap,
    prefix: Option<&'a str>,
    mapper: &'a dyn KeyMapper,
    /// Derived-key prefix for the current nesting level, e.g. `DATABASE_`.
    path: String,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(
        values: &'a FlatMap,
        prefix: Option<&'a str>,
        mapper: &'a dyn KeyMapper,
    ) -> Self {
        Self {
            values,
            prefix,
            mapper,
            path: String::new(),
        }
    }

    fn key_for(&self, name: &str) -> String {
        let leaf = self.mapper.field(name);
        match self.prefix {
            Some(prefix) => format!("{prefix}_{}{leaf}", self.path),
            None => format!("{}{leaf}", self.path),
        }
    }
}

impl FieldVisitor for Binder<'_> {
    fn leaf<F: FromValue>(
        &mut self,
        name: &str,
        _meta: FieldMeta,
        field: &mut F,
    ) -> Result<(), HotfigError> {
        let key = self.key_for(name);
        let Some(value) = self.values.get(&key) else {
            return Ok(());
        };
        if !value.is_present() {
            return Ok(());
        }

        *field = F::from_value(value).map_err(|err| match err {
            CoerceError::Unsupported { kind } => HotfigError::UnsupportedType {
                key: key.clone(),
                kind: kind.to_string(),
            },
            CoerceError::Invalid(reason) => HotfigError::Parse {
                key: key.clone(),
                reason,
            },
        })?;
        Ok(())
    }

    fn nested<R: Record>(&mut self, name: &str, record: &mut R) -> Result<(), HotfigError> {
        let saved = self.path.len();
        self.path.push_str(&self.mapper.field(name));
        self.path.push('_');
        let result = record.visit(self);
        self.path.truncate(saved);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{flat, TestConfig};
    use crate::keymap::ScreamingSnake;
    use crate::value::Value;

    fn bind(config: &mut TestConfig, values: &FlatMap, prefix: Option<&str>) -> Result<(), HotfigError> {
        let mut binder = Binder::new(values, prefix, &ScreamingSnake);
        config.visit(&mut binder)
    }

    #[test]
    fn binds_leaves_and_nested_paths() {
        let values = flat(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("DEBUG", "true"),
            ("DATABASE_URL", "pg://db"),
            ("DATABASE_POOL_SIZE", "20"),
        ]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, None).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(config.debug);
        assert_eq!(config.database.url, "pg://db");
        assert_eq!(config.database.pool_size, 20);
    }

    #[test]
    fn absent_key_leaves_field_alone() {
        let values = flat(&[("HOST", "somewhere")]);
        let mut config = TestConfig::default();
        config.port = 1234;
        bind(&mut config, &values, None).unwrap();
        assert_eq!(config.port, 1234);
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let values = flat(&[("PORT", "")]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, None).unwrap();
        assert_eq!(config.port, 0);
    }

    #[test]
    fn prefix_requires_exact_match() {
        let values = flat(&[("APP_PORT", "9000"), ("PORT", "1111")]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, Some("APP")).unwrap();
        assert_eq!(config.port, 9000);

        // Only the unprefixed key present: invisible under a prefix.
        let values = flat(&[("PORT", "1111")]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, Some("APP")).unwrap();
        assert_eq!(config.port, 0);
    }

    #[test]
    fn prefix_applies_to_nested_paths() {
        let values = flat(&[("APP_DATABASE_POOL_SIZE", "7")]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, Some("APP")).unwrap();
        assert_eq!(config.database.pool_size, 7);
    }

    #[test]
    fn parse_failure_names_the_key() {
        let values = flat(&[("DATABASE_POOL_SIZE", "many")]);
        let mut config = TestConfig::default();
        let err = bind(&mut config, &values, None).unwrap_err();
        match err {
            HotfigError::Parse { key, .. } => assert_eq!(key, "DATABASE_POOL_SIZE"),
            other => panic!("expected Parse, got: {other:?}"),
        }
    }

    #[test]
    fn parse_failure_aborts_whole_bind() {
        // PORT fails; HOST must not matter, the record is discarded wholesale.
        let values = flat(&[("PORT", "nope"), ("HOST", "h")]);
        let mut config = TestConfig::default();
        assert!(bind(&mut config, &values, None).is_err());
    }

    #[test]
    fn native_sequence_binds() {
        let mut values = FlatMap::new();
        values.insert(
            "HOSTS".into(),
            Value::Seq(vec![Value::Str("a".into()), Value::Str("b".into())]),
        );
        let mut config = TestConfig::default();
        bind(&mut config, &values, None).unwrap();
        assert_eq!(config.hosts, vec!["a", "b"]);
    }

    #[test]
    fn csv_string_binds_sequence() {
        let values = flat(&[("HOSTS", "h1, h2, h3")]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, None).unwrap();
        assert_eq!(config.hosts, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn duration_leaf_is_not_recursed() {
        let values = flat(&[("TIMEOUT", "5m30s")]);
        let mut config = TestConfig::default();
        bind(&mut config, &values, None).unwrap();
        assert_eq!(config.timeout, std::time::Duration::from_secs(330));
    }
}
