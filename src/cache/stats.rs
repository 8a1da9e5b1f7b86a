use std::fmt;

/// Loading and error flags of one independently fetched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource<E> {
    pub loading: bool,
    pub error: Option<E>,
}

impl<E> Default for Resource<E> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
        }
    }
}

impl<E> Resource<E> {
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self) {
        self.loading = false;
    }

    pub fn fail(&mut self, error: E) {
        self.loading = false;
        self.error = Some(error);
    }
}

/// Share of requests answered from cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRate(pub f64);

impl HitRate {
    pub fn from_counts(hits: u64, api_calls: u64) -> Self {
        let total = hits + api_calls;
        if total == 0 {
            HitRate(0.0)
        } else {
            HitRate(hits as f64 / total as f64)
        }
    }
}

impl fmt::Display for HitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * 100.0).round() as u64)
    }
}
