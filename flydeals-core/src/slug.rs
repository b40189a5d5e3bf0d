use crate::repository::{DealRepository, RepoResult};

/// Base used when a title contains nothing slug-worthy (e.g. only emoji).
pub const FALLBACK_SLUG: &str = "deal";

/// Derives a URL-safe slug from a free-text title.
///
/// Lowercases, turns spaces into hyphens, strips everything outside
/// `[a-z0-9-]`, collapses hyphen runs and trims hyphens from both ends.
/// Can return an empty string; see [`base_slug`].
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.to_lowercase().chars() {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    slug.trim_matches('-').to_string()
}

/// [`slugify`], falling back to [`FALLBACK_SLUG`] when nothing survives.
pub fn base_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The `n`-th uniqueness candidate: `base`, `base-1`, `base-2`, ...
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}

/// Probes candidates in order until one is not taken.
///
/// Check-then-insert: two concurrent creations of the same title can both
/// pick the same candidate. The unique index on `deals.slug` rejects the
/// second insert.
pub async fn unique_slug(deals: &dyn DealRepository, base: &str) -> RepoResult<String> {
    let mut n = 0;
    loop {
        let slug = candidate(base, n);
        if !deals.slug_exists(&slug).await? {
            return Ok(slug);
        }
        tracing::debug!("Slug '{}' taken, trying next suffix", slug);
        n += 1;
    }
}
