//! # Label / Tag Mapping
//!
//! Kubernetes labels map onto Scaleway tags as `key=value` strings.

use std::collections::BTreeMap;

/// Transform labels into tags
pub fn labels_to_tags(labels: &BTreeMap<String, String>) -> Vec<String> {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
}

/// Returns true if the tags and labels represent the same set
pub fn compare_tags_labels(tags: &[String], labels: &BTreeMap<String, String>) -> bool {
    if tags.len() != labels.len() {
        return false;
    }
    labels
        .iter()
        .all(|(key, value)| tags.iter().any(|tag| *tag == format!("{key}={value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn labels_become_key_value_tags() {
        let tags = labels_to_tags(&labels(&[("app", "db"), ("env", "prod")]));
        assert_eq!(tags, vec!["app=db".to_string(), "env=prod".to_string()]);
    }

    #[test]
    fn compare_detects_equal_sets() {
        let labels = labels(&[("app", "db"), ("env", "prod")]);
        let tags = vec!["env=prod".to_string(), "app=db".to_string()];
        assert!(compare_tags_labels(&tags, &labels));
    }

    #[test]
    fn compare_detects_divergence() {
        let labels = labels(&[("app", "db")]);
        assert!(!compare_tags_labels(&["app=web".to_string()], &labels));
        assert!(!compare_tags_labels(&[], &labels));
        assert!(!compare_tags_labels(
            &["app=db".to_string(), "extra=1".to_string()],
            &labels
        ));
    }
}
