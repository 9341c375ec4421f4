//! Default capacities of the well-known Black Duck storage claims.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Capacity requested by each known claim when the instance gives no size.
///
/// Every claim is known both by its short name and by its `blackduck-` prefixed name.
pub static DEFAULT_CLAIM_SIZES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("postgres", "150Gi"),
        ("authentication", "2Gi"),
        ("cfssl", "2Gi"),
        ("registration", "2Gi"),
        ("solr", "2Gi"),
        ("webapp", "2Gi"),
        ("logstash", "20Gi"),
        ("zookeeper-data", "2Gi"),
        ("zookeeper-datalog", "2Gi"),
        ("blackduck-postgres", "150Gi"),
        ("blackduck-authentication", "2Gi"),
        ("blackduck-cfssl", "2Gi"),
        ("blackduck-registration", "2Gi"),
        ("blackduck-solr", "2Gi"),
        ("blackduck-webapp", "2Gi"),
        ("blackduck-logstash", "20Gi"),
        ("blackduck-zookeeper-data", "2Gi"),
        ("blackduck-zookeeper-datalog", "2Gi"),
    ])
});

/// Look up the default size of a claim, `None` for unknown names
pub fn default_size_for(claim_name: &str) -> Option<&'static str> {
    DEFAULT_CLAIM_SIZES.get(claim_name).copied()
}
