/// Decides whether a notified object should be processed at all
pub trait EligibilityPredicate: Send + Sync + 'static {
    fn is_supported(&self, key: &str) -> bool;
}

/// Accepts every key
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl EligibilityPredicate for AcceptAll {
    fn is_supported(&self, _key: &str) -> bool {
        true
    }
}
