// Title-prefix filtering for search results.

use crate::github::Issue;

/// Drop issues whose title starts with `"<prefix>:"` or `"<prefix>s:"`,
/// ignoring case. Order is preserved.
pub fn filter_out<S: AsRef<str>>(issues: Vec<Issue>, prefixes: &[S]) -> Vec<Issue> {
    issues
        .into_iter()
        .filter(|issue| !has_excluded_prefix(&issue.title, prefixes))
        .collect()
}

fn has_excluded_prefix<S: AsRef<str>>(title: &str, prefixes: &[S]) -> bool {
    let title = title.to_lowercase();
    prefixes.iter().any(|prefix| {
        let prefix = prefix.as_ref().to_lowercase();
        title.starts_with(&format!("{}:", prefix)) || title.starts_with(&format!("{}s:", prefix))
    })
}
