//! Portal endpoint URL builders

/// `package_show` action; the dataset id goes in the `id` query parameter
pub fn package_show_url(base_url: &str) -> String {
    format!("{}/api/3/action/package_show", trim_base(base_url))
}

/// Bulk dump of one datastore resource
pub fn datastore_dump_url(base_url: &str, resource_id: &str) -> String {
    format!("{}/datastore/dump/{}", trim_base(base_url), resource_id)
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
