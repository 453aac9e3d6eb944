//! One resolution pass: merge all providers into a flat map, bind it onto a
//! fresh default-initialized record, run the validator chain. Pure with
//! respect to loader state; the reloadable path calls this and swaps the
//! result in afterwards.

use crate::bind::Binder;
use crate::error::HotfigError;
use crate::merge::merge_providers;
use crate::options::Options;
use crate::provider::{DefaultsProvider, EnvProvider, Provider};
use crate::record::Record;
use crate::validate::run_chain;
use crate::value::FlatMap;

pub(crate) fn resolve<T: Record + 'static>(options: &Options<T>) -> Result<T, HotfigError> {
    let merged = merge_all(options)?;
    let prefix = options.prefix.as_deref();

    let mut record = T::default();
    let mut binder = Binder::new(&merged, prefix, &*options.mapper);
    record.visit(&mut binder)?;

    run_chain(
        &mut record,
        prefix,
        &*options.mapper,
        options.validator.as_deref(),
    )?;

    Ok(record)
}

fn merge_all<T: Record + 'static>(options: &Options<T>) -> Result<FlatMap, HotfigError> {
    if options.providers.is_empty() {
        let implicit: Vec<Box<dyn Provider>> = vec![
            Box::new(DefaultsProvider::<T>::with_mapper(options.mapper.clone())),
            Box::new(EnvProvider),
        ];
        return merge_providers(&implicit, options.prefix.as_deref());
    }
    merge_providers(&options.providers, options.prefix.as_deref())
}
