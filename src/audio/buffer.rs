use super::fragment::AudioFragment;

/// Per-session audio buffers
///
/// `pending` holds fragments received since the last non-final batch was
/// dispatched. `cumulative` holds every fragment since the session started and
/// is only consumed by the final batch.
#[derive(Debug, Default)]
pub struct SessionBuffer {
    pending: Vec<AudioFragment>,
    cumulative: Vec<AudioFragment>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to both buffers, in arrival order
    pub fn append(&mut self, fragment: AudioFragment) {
        self.cumulative.push(fragment.clone());
        self.pending.push(fragment);
    }

    /// Take everything pending, leaving the cumulative buffer untouched
    pub fn drain_pending(&mut self) -> Vec<AudioFragment> {
        std::mem::take(&mut self.pending)
    }

    pub fn snapshot_cumulative(&self) -> Vec<AudioFragment> {
        self.cumulative.clone()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.cumulative.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn cumulative_len(&self) -> usize {
        self.cumulative.len()
    }

    /// Total payload bytes received since session start
    pub fn cumulative_bytes(&self) -> usize {
        self.cumulative.iter().map(AudioFragment::len).sum()
    }
}
