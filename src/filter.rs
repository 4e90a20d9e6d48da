use serde::{Deserialize, Serialize};

use crate::models::Posting;

/// Catalog search criteria. Blank fields are ignored; the rest combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingFilter {
    /// Free text, matched against title, company and description.
    pub search: Option<String>,
    pub location: Option<String>,
    /// Matched against each tag.
    pub domain: Option<String>,
    pub limit: Option<usize>,
}

impl PostingFilter {
    pub fn is_empty(&self) -> bool {
        self.search().is_none()
            && self.location().is_none()
            && self.domain().is_none()
            && self.limit.is_none()
    }

    fn search(&self) -> Option<String> {
        normalized(&self.search)
    }

    fn location(&self) -> Option<String> {
        normalized(&self.location)
    }

    fn domain(&self) -> Option<String> {
        normalized(&self.domain)
    }

    /// Overlays the fields set in `other`, keeping the rest.
    pub fn merge(&mut self, other: PostingFilter) {
        if other.search.is_some() {
            self.search = other.search;
        }
        if other.location.is_some() {
            self.location = other.location;
        }
        if other.domain.is_some() {
            self.domain = other.domain;
        }
        if other.limit.is_some() {
            self.limit = other.limit;
        }
    }

    pub fn matches(&self, posting: &Posting) -> bool {
        if let Some(needle) = self.search() {
            let hit = contains(&posting.title, &needle)
                || contains(&posting.company, &needle)
                || contains(&posting.description, &needle);
            if !hit {
                return false;
            }
        }
        if let Some(needle) = self.location() {
            if !contains(&posting.location, &needle) {
                return false;
            }
        }
        if let Some(needle) = self.domain() {
            if !posting.tags.iter().any(|tag| contains(tag, &needle)) {
                return false;
            }
        }
        true
    }

    /// Keeps matching postings in source order, then applies the cap.
    /// A zero limit means no cap.
    pub fn apply<'a, I>(&self, postings: I) -> Vec<Posting>
    where
        I: IntoIterator<Item = &'a Posting>,
    {
        let matching = postings.into_iter().filter(|p| self.matches(p)).cloned();
        match self.limit {
            Some(limit) if limit > 0 => matching.take(limit).collect(),
            _ => matching.collect(),
        }
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostingStatus;
    use chrono::Utc;

    fn posting(id: i64, title: &str, company: &str, location: &str, tags: &[&str]) -> Posting {
        Posting {
            id,
            title: title.to_string(),
            company: company.to_string(),
            company_id: None,
            location: location.to_string(),
            duration: "6 months".to_string(),
            description: format!("{} at {}", title, company),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status: PostingStatus::Active,
            created_at: Utc::now(),
            applications_count: 0,
            salary: None,
            start_date: None,
            missions: vec![],
            requirements: vec![],
            benefits: vec![],
            positions: 1,
        }
    }

    fn catalog() -> Vec<Posting> {
        vec![
            posting(1, "Full Stack Developer", "TechCorp", "Paris, France", &["React", "Node.js"]),
            posting(2, "Digital Marketing", "Digital Agency", "Lyon, France", &["SEO", "Social Media"]),
            posting(3, "Data Analyst", "DataLab", "Bordeaux, France", &["Python", "SQL"]),
            posting(4, "Backend Developer", "TechCorp", "Lyon, France", &["Rust", "SQL"]),
        ]
    }

    fn ids(postings: &[Posting]) -> Vec<i64> {
        postings.iter().map(|p| p.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let all = catalog();
        let filter = PostingFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&all)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_company_description() {
        let all = catalog();
        let by_company = PostingFilter {
            search: Some("techCORP".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_company.apply(&all)), vec![1, 4]);

        let by_title = PostingFilter {
            search: Some("analyst".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_title.apply(&all)), vec![3]);
    }

    #[test]
    fn filters_combine_with_and() {
        let all = catalog();
        let filter = PostingFilter {
            location: Some("lyon".to_string()),
            domain: Some("sql".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&all)), vec![4]);
    }

    #[test]
    fn domain_matches_tag_substrings() {
        let all = catalog();
        let filter = PostingFilter {
            domain: Some("node".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&all)), vec![1]);
    }

    #[test]
    fn limit_caps_after_filtering() {
        let all = catalog();
        let filter = PostingFilter {
            location: Some("France".to_string()),
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&all)), vec![1, 2]);
    }

    #[test]
    fn zero_limit_keeps_every_match() {
        let all = catalog();
        let filter = PostingFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&all)), vec![1, 2, 3, 4]);

        let in_lyon = PostingFilter {
            location: Some("lyon".to_string()),
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(ids(&in_lyon.apply(&all)), vec![2, 4]);
    }

    #[test]
    fn blank_fields_are_ignored() {
        let all = catalog();
        let filter = PostingFilter {
            search: Some("   ".to_string()),
            location: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&all).len(), all.len());
    }

    #[test]
    fn every_combination_is_a_subset_satisfying_each_predicate() {
        let all = catalog();
        let searches = [None, Some("dev"), Some("agency"), Some("zzz")];
        let locations = [None, Some("lyon"), Some("paris")];
        let domains = [None, Some("sql"), Some("react")];
        let limits = [None, Some(0), Some(1), Some(10)];

        for s in &searches {
            for l in &locations {
                for d in &domains {
                    for lim in &limits {
                        let filter = PostingFilter {
                            search: s.map(str::to_string),
                            location: l.map(str::to_string),
                            domain: d.map(str::to_string),
                            limit: *lim,
                        };
                        let result = filter.apply(&all);
                        match lim {
                            Some(cap) if *cap > 0 => assert!(result.len() <= *cap),
                            _ => assert_eq!(result.len(), all.iter().filter(|p| filter.matches(p)).count()),
                        }
                        for p in &result {
                            assert!(all.iter().any(|q| q.id == p.id));
                            assert!(filter.matches(p));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn merge_overlays_only_set_fields() {
        let mut filter = PostingFilter {
            search: Some("dev".to_string()),
            location: Some("Paris".to_string()),
            ..Default::default()
        };
        filter.merge(PostingFilter {
            location: Some("Lyon".to_string()),
            ..Default::default()
        });
        assert_eq!(filter.search.as_deref(), Some("dev"));
        assert_eq!(filter.location.as_deref(), Some("Lyon"));
    }
}
