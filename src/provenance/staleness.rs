use super::record::LastModifiedRecord;

/// Decide whether a freshly fetched record reveals an external edit worth a
/// notification: strictly newer than the stored record AND made by someone
/// else. Without a stored record there is nothing to compare, so no notice.
pub fn should_notify(stored: Option<&LastModifiedRecord>, fresh: &LastModifiedRecord) -> bool {
    let Some(stored) = stored else {
        return false;
    };

    fresh.last_modified_date > stored.last_modified_date
        && fresh.last_modified_by_id != stored.last_modified_by_id
}
