use super::record::DirectoryRecord;

/// The search box contents. Matching uses the trimmed, lower-cased form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    needle: String,
}

impl SearchTerm {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.trim().to_lowercase();
        Self { raw, needle }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches<R: DirectoryRecord>(&self, record: &R) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        record
            .searchable_text()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

pub fn filter_records<'a, R, I>(records: I, term: &SearchTerm) -> Vec<&'a R>
where
    R: DirectoryRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records.into_iter().filter(|r| term.matches(*r)).collect()
}
