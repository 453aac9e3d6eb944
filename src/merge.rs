//! Provider merging: an ordered list of providers collapses into one flat
//! key/value set. Later providers overwrite earlier ones on key collision;
//! that ordering is the whole layering story (defaults < file < environment).

use crate::error::HotfigError;
use crate::provider::Provider;
use crate::value::FlatMap;

/// Merge provider outputs in order. Any provider failure aborts the pass;
/// no partial merge is retained.
///
/// When `prefix` is set, every key from a provider that is not
/// prefix-aware is rewritten to `<PREFIX>_<KEY>`. Prefix-aware providers
/// (the process environment) pass through untouched, since their keys
/// already carry the prefix.
pub(crate) fn merge_providers(
    providers: &[Box<dyn Provider>],
    prefix: Option<&str>,
) -> Result<FlatMap, HotfigError> {
    let mut merged = FlatMap::new();

    for provider in providers {
        let values = provider.values()?;
        match prefix {
            Some(prefix) if !provider.is_prefix_aware() => {
                for (key, value) in values {
                    merged.insert(format!("{prefix}_{key}"), value);
                }
            }
            _ => merged.extend(values),
        }
    }

    Ok(merged)
}
