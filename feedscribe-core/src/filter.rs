use crate::types::{Candidate, FeedItem};
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Case-insensitive URL suffix allow-list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionAllowList {
    extensions: Vec<String>,
}

impl ExtensionAllowList {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim().to_ascii_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();
        Self { extensions }
    }

    pub fn allows(&self, url: &str) -> bool {
        self.matched_extension(url).is_some()
    }

    /// Returns the allow-listed extension (without the dot) the URL ends in.
    pub fn matched_extension(&self, url: &str) -> Option<&str> {
        let url = url.to_ascii_lowercase();
        self.extensions
            .iter()
            .find(|ext| url.ends_with(ext.as_str()))
            .map(|ext| ext.trim_start_matches('.'))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for ExtensionAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_EXTENSIONS)
    }
}

/// Keeps at most `limit` items that are new, carry a URL, and point at an
/// allow-listed image. Upstream order is preserved; repeated ids keep their
/// first occurrence.
pub fn select_candidates<I>(
    items: I,
    known_ids: &HashSet<String>,
    allow_list: &ExtensionAllowList,
    limit: usize,
) -> Vec<Candidate>
where
    I: IntoIterator<Item = FeedItem>,
{
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for item in items {
        if candidates.len() >= limit {
            break;
        }
        if known_ids.contains(&item.id) {
            debug!("Skipping known post {}", item.id);
            continue;
        }
        let allowed = item.url.as_deref().is_some_and(|url| allow_list.allows(url));
        if !allowed || seen.contains(&item.id) {
            continue;
        }
        seen.insert(item.id.clone());
        if let Some(candidate) = Candidate::from_feed_item(item) {
            candidates.push(candidate);
        }
    }

    candidates
}

/// True when the text is non-empty and longer than `threshold` characters.
pub fn passes_quality_threshold(text: &str, threshold: usize) -> bool {
    !text.is_empty() && text.chars().count() > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, url: Option<&str>) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            title: format!("Post {}", id),
            score: 10,
            url: url.map(str::to_string),
            num_comments: 2,
            upvote_ratio: Some(0.9),
        }
    }

    #[test]
    fn test_extension_matching_is_case_insensitive() {
        let allow_list = ExtensionAllowList::default();
        assert!(allow_list.allows("https://i.redd.it/abc.JPG"));
        assert!(allow_list.allows("https://i.redd.it/abc.jpeg"));
        assert!(allow_list.allows("https://i.redd.it/abc.Png"));
        assert!(!allow_list.allows("https://i.redd.it/abc.gif"));
        assert!(!allow_list.allows("https://www.reddit.com/r/test/comments/abc"));
    }

    #[test]
    fn test_matched_extension() {
        let allow_list = ExtensionAllowList::new(["PNG", ".jpg"]);
        assert_eq!(allow_list.matched_extension("a/b.png"), Some("png"));
        assert_eq!(allow_list.matched_extension("a/b.JPG"), Some("jpg"));
        assert_eq!(allow_list.matched_extension("a/b.jpeg"), None);
        assert_eq!(allow_list.extensions(), &[".png".to_string(), ".jpg".to_string()]);
    }

    #[test]
    fn test_select_skips_known_ids_and_non_images() {
        let known: HashSet<String> = ["b".to_string()].into_iter().collect();
        let items = vec![
            item("a", Some("https://i.redd.it/a.jpg")),
            item("b", Some("https://i.redd.it/b.jpg")),
            item("c", Some("https://i.redd.it/c.gif")),
            item("d", None),
            item("e", Some("https://i.redd.it/e.PNG")),
        ];

        let candidates = select_candidates(items, &known, &ExtensionAllowList::default(), 10);
        let ids: Vec<&str> = candidates.iter().map(|c| c.post_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e"]);
        assert_eq!(candidates[0].upvote_ratio, 0.9);
    }

    #[test]
    fn test_select_respects_limit_and_batch_duplicates() {
        let items = vec![
            item("a", Some("https://i.redd.it/a.jpg")),
            item("a", Some("https://i.redd.it/a.jpg")),
            item("b", Some("https://i.redd.it/b.jpg")),
            item("c", Some("https://i.redd.it/c.jpg")),
        ];

        let candidates =
            select_candidates(items, &HashSet::new(), &ExtensionAllowList::default(), 2);
        let ids: Vec<&str> = candidates.iter().map(|c| c.post_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_selection_is_not_an_error() {
        let candidates = select_candidates(
            vec![item("a", Some("https://v.redd.it/a.mp4"))],
            &HashSet::new(),
            &ExtensionAllowList::default(),
            5,
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_second_run_with_updated_known_ids_has_no_overlap() {
        let upstream = || {
            vec![
                item("a", Some("https://i.redd.it/a.jpg")),
                item("b", Some("https://i.redd.it/b.png")),
                item("c", Some("https://i.redd.it/c.jpeg")),
            ]
        };
        let allow_list = ExtensionAllowList::default();
        let mut known = HashSet::new();

        let first = select_candidates(upstream(), &known, &allow_list, 10);
        assert_eq!(first.len(), 3);
        known.extend(first.iter().map(|c| c.post_id.clone()));

        let second = select_candidates(upstream(), &known, &allow_list, 10);
        assert!(second.iter().all(|c| !known.contains(&c.post_id)));
        assert!(second.is_empty());
    }

    #[test]
    fn test_quality_threshold_is_strict() {
        assert!(!passes_quality_threshold(&"x".repeat(50), 50));
        assert!(passes_quality_threshold(&"x".repeat(51), 50));
        assert!(!passes_quality_threshold("", 0));
        // Counted in characters, not bytes.
        assert!(!passes_quality_threshold(&"é".repeat(50), 50));
    }
}
