//! Resource tag helpers

use std::collections::BTreeMap;

const MAX_TAGS: usize = 50;
const MAX_KEY_LENGTH: usize = 512;
const MAX_VALUE_LENGTH: usize = 256;

/// Validate a tag mapping against ARM limits
pub fn validate(tags: &BTreeMap<String, String>) -> Result<(), String> {
    if tags.len() > MAX_TAGS {
        return Err(format!("a maximum of {} tags can be applied to each ARM resource", MAX_TAGS));
    }

    for (key, value) in tags {
        if key.chars().count() > MAX_KEY_LENGTH {
            return Err(format!(
                "the maximum length for a tag key is {} characters: {:?}",
                MAX_KEY_LENGTH, key
            ));
        }
        if value.chars().count() > MAX_VALUE_LENGTH {
            return Err(format!(
                "the maximum length for a tag value is {} characters: the value for {:?} is {} characters",
                MAX_VALUE_LENGTH,
                key,
                value.chars().count()
            ));
        }
    }

    Ok(())
}

/// Local tags -> request body. Always a map, possibly empty, so that a PATCH
/// clears tags removed locally.
pub fn expand(tags: &BTreeMap<String, String>) -> BTreeMap<String, Option<String>> {
    tags.iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect()
}

/// Remote tags -> local tags. Null values become empty strings.
pub fn flatten(tags: Option<&BTreeMap<String, Option<String>>>) -> BTreeMap<String, String> {
    tags.map(|tags| {
        tags.iter()
            .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
            .collect()
    })
    .unwrap_or_default()
}
