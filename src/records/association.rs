//! Trajectory → track association table.

use crate::{
    constants::Key,
    records::{track::OutputTrack, Ref},
    trajectory::Trajectory,
};

/// Ordered one-to-one map from retained trajectories to the tracks built from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajTrackAssociation {
    entries: Vec<(Ref<Trajectory>, Ref<OutputTrack>)>,
}

impl TrajTrackAssociation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, trajectory: Ref<Trajectory>, track: Ref<OutputTrack>) {
        self.entries.push((trajectory, track));
    }

    /// Track built from the trajectory at `trajectory_key`, if any.
    pub fn track_for(&self, trajectory_key: Key) -> Option<Ref<OutputTrack>> {
        self.entries
            .iter()
            .find(|(traj, _)| traj.key() == trajectory_key)
            .map(|(_, track)| *track)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Ref<Trajectory>, Ref<OutputTrack>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
