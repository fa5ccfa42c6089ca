//! Name-similarity ranking used to recover exercises whose catalog id has
//! disappeared or changed.

use strsim::levenshtein;

use crate::models::Exercise;

/// Maximum number of suggestions returned by [`suggest_replacements`].
pub const MAX_SUGGESTIONS: usize = 5;

/// Edit distance between the lowercased forms of `a` and `b`, counted over
/// Unicode scalar values.
pub fn name_distance(a: &str, b: &str) -> usize {
    levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Returns up to five catalog entries whose name resembles `query`, closest
/// first.
///
/// A candidate survives the filter when its name contains the query, the
/// query contains its name, or one of its alternate names contains the query
/// (all case-insensitive). Survivors are ordered by edit distance; equal
/// distances keep catalog order.
pub fn suggest_replacements<'a>(query: &str, exercises: &'a [Exercise]) -> Vec<&'a Exercise> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, &Exercise)> = exercises
        .iter()
        .filter(|ex| {
            let name = ex.name.to_lowercase();
            name.contains(&query)
                || query.contains(&name)
                || ex.alt_names.iter().any(|alt| alt.to_lowercase().contains(&query))
        })
        .map(|ex| (levenshtein(&query, &ex.name.to_lowercase()), ex))
        .collect();

    // `sort_by_key` is stable, so ties keep catalog order.
    ranked.sort_by_key(|(distance, _)| *distance);

    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, ex)| ex)
        .collect()
}

/// The single closest match, if any candidate passes the filter.
pub fn best_match<'a>(query: &str, exercises: &'a [Exercise]) -> Option<&'a Exercise> {
    suggest_replacements(query, exercises).into_iter().next()
}
