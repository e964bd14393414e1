//! File patches to be used in integration tests.
//!
//! This is used to test small variations on existing example scenarios.
use crate::patch::FilePatch;
use anyhow::{Context, Result};
use std::{collections::BTreeMap, sync::LazyLock};

/// A map of file patches, keyed by name
type PatchMap = BTreeMap<&'static str, Vec<FilePatch>>;

/// The file patches, keyed by name
static PATCHES: LazyLock<PatchMap> = LazyLock::new(get_all_patches);

/// Get all patches
fn get_all_patches() -> PatchMap {
    [
        (
            // The simple example with the gas price doubled
            "simple_expensive_gas",
            vec![
                FilePatch::new("inputs/fuel_prices.tab")
                    .with_header("fuel,period,month,fuel_price_per_mmbtu")
                    .with_deletion("Gas,2030,1,3")
                    .with_addition("Gas,2030,1,6"),
            ],
        ),
        // The simple example with neither overgeneration nor unserved energy allowed
        (
            "simple_no_slack",
            vec![
                FilePatch::new("inputs/load_zones.tab")
                    .with_deletion("Z1,1,99999,1,99999")
                    .with_addition("Z1,0,.,0,."),
            ],
        ),
    ]
    .into_iter()
    .collect()
}

/// Get the names for all the patches
pub fn get_patch_names() -> impl Iterator<Item = &'static str> {
    PATCHES.keys().copied()
}

/// Get patches for the named patched example
pub fn get_patches(name: &str) -> Result<&[FilePatch]> {
    Ok(PATCHES
        .get(name)
        .with_context(|| format!("Patched example '{name}' not found"))?)
}

/// Get the name of the example a patched example is based on
pub fn get_base_example(name: &str) -> &str {
    name.split_once('_').map_or(name, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patched_examples_have_known_base() {
        for name in get_patch_names() {
            assert_eq!(get_base_example(name), "simple");
        }
    }
}
