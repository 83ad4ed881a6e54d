use crate::road::Road;
use crate::track::Track;

/// Number of objects leaving each stage for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StageCounts {
    pub hits: usize,
    pub roads: usize,
    pub clean_roads: usize,
    pub slim_roads: usize,
    pub tracks: usize,
}

/// Full pipeline output for a single event.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EventResult {
    /// Roads from pattern recognition, per sector in processor order.
    pub roads: Vec<Road>,
    /// Cleaned roads, highest sort code first.
    pub clean_roads: Vec<Road>,
    /// One hit per layer; index-aligned with `clean_roads`.
    pub slim_roads: Vec<Road>,
    pub tracks: Vec<Track>,
    /// Input hit count.
    pub n_hits: usize,
}

impl EventResult {
    pub fn counts(&self) -> StageCounts {
        StageCounts {
            hits: self.n_hits,
            roads: self.roads.len(),
            clean_roads: self.clean_roads.len(),
            slim_roads: self.slim_roads.len(),
            tracks: self.tracks.len(),
        }
    }
}
