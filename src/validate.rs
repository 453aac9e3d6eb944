//! The validator chain: required-field check, then caller validator, then
//! intrinsic validator. Fixed order, first failure wins.
//!
//! The required check is a second visitor pass over the already-bound
//! record. Zero-ness is decided generically through
//! [`FromValue::is_zero`](crate::FromValue::is_zero): empty string, zero
//! number, `false`, empty sequence, `None`.

use crate::coerce::FromValue;
use crate::error::HotfigError;
use crate::keymap::KeyMapper;
use crate::record::{FieldMeta, FieldVisitor, Record};

/// Walks the bound record and fails on the first required field still at
/// its zero value, naming the field's canonical key.
pub(crate) struct RequiredCheck<'a> {
    prefix: Option<&'a str>,
    mapper: &'a dyn KeyMapper,
    path: String,
}

impl<'a> RequiredCheck<'a> {
    pub(crate) fn new(prefix: Option<&'a str>, mapper: &'a dyn KeyMapper) -> Self {
        Self {
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

impl FieldVisitor for RequiredCheck<'_> {
    fn leaf<F: FromValue>(
        &mut self,
        name: &str,
        meta: FieldMeta,
        field: &mut F,
    ) -> Result<(), HotfigError> {
        if meta.required && field.is_zero() {
            return Err(HotfigError::Required {
                key: self.key_for(name),
            });
        }
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

/// Run the full chain on a bound record.
pub(crate) fn run_chain<T: Record>(
    record: &mut T,
    prefix: Option<&str>,
    mapper: &dyn KeyMapper,
    caller: Option<&(dyn Fn(&T) -> Result<(), String> + Send + Sync)>,
) -> Result<(), HotfigError> {
    let mut required = RequiredCheck::new(prefix, mapper);
    record.visit(&mut required)?;

    if let Some(validate) = caller {
        validate(record).map_err(|reason| HotfigError::Validation { reason })?;
    }

    record
        .validate()
        .map_err(|reason| HotfigError::Validation { reason })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::ScreamingSnake;
    use crate::record;

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Credentials {
            token: String [required],
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Service {
            name: String,
            credentials: Credentials [nested],
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct SelfChecked {
        port: u16,
    }

    impl Record for SelfChecked {
        fn visit<V: FieldVisitor>(&mut self, visitor: &mut V) -> Result<(), HotfigError> {
            visitor.leaf("port", FieldMeta::new(), &mut self.port)?;
            Ok(())
        }

        fn validate(&self) -> Result<(), String> {
            if self.port < 1024 {
                return Err("port must be >= 1024".into());
            }
            Ok(())
        }
    }

    #[test]
    fn required_zero_value_fails_with_canonical_key() {
        let mut service = Service::default();
        let err = run_chain(&mut service, None, &ScreamingSnake, None).unwrap_err();
        match err {
            HotfigError::Required { key } => assert_eq!(key, "CREDENTIALS_TOKEN"),
            other => panic!("expected Required, got: {other:?}"),
        }
    }

    #[test]
    fn required_key_includes_prefix() {
        let mut service = Service::default();
        let err = run_chain(&mut service, Some("APP"), &ScreamingSnake, None).unwrap_err();
        assert_eq!(err.key(), Some("APP_CREDENTIALS_TOKEN"));
    }

    #[test]
    fn required_satisfied_passes() {
        let mut service = Service::default();
        service.credentials.token = "abc".into();
        run_chain(&mut service, None, &ScreamingSnake, None).unwrap();
    }

    #[test]
    fn caller_validator_runs_after_required() {
        let mut service = Service::default();
        service.credentials.token = "abc".into();
        let err = run_chain(
            &mut service,
            None,
            &ScreamingSnake,
            Some(&|s: &Service| {
                if s.name.is_empty() {
                    Err("name must be set".into())
                } else {
                    Ok(())
                }
            }),
        )
        .unwrap_err();
        match err {
            HotfigError::Validation { reason } => assert!(reason.contains("name")),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn required_failure_short_circuits_caller_validator() {
        let mut service = Service::default();
        let err = run_chain(
            &mut service,
            None,
            &ScreamingSnake,
            Some(&|_: &Service| Err("should not run".into())),
        )
        .unwrap_err();
        assert!(matches!(err, HotfigError::Required { .. }));
    }

    #[test]
    fn intrinsic_validator_runs_last() {
        let mut checked = SelfChecked { port: 80 };
        let err = run_chain(&mut checked, None, &ScreamingSnake, None).unwrap_err();
        match err {
            HotfigError::Validation { reason } => assert!(reason.contains("1024")),
            other => panic!("expected Validation, got: {other:?}"),
        }

        let mut checked = SelfChecked { port: 8080 };
        run_chain(&mut checked, None, &ScreamingSnake, None).unwrap();
    }

    #[test]
    fn caller_validator_precedes_intrinsic() {
        let mut checked = SelfChecked { port: 80 };
        let err = run_chain(
            &mut checked,
            None,
            &ScreamingSnake,
            Some(&|_: &SelfChecked| Err("caller first".into())),
        )
        .unwrap_err();
        match err {
            HotfigError::Validation { reason } => assert_eq!(reason, "caller first"),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }
}
