use thiserror::Error;

use crate::det_id::DetId;

#[derive(Error, Debug)]
pub enum TrackoutError {
    #[error("Fitter declined to produce a trajectory")]
    FitDeclined,

    #[error("Trajectory fit failed: {0}")]
    FitFailed(String),

    #[error("Malformed trajectory: {0}")]
    MalformedTrajectory(String),

    #[error("Measurement {0} carries no hit")]
    MissingHit(usize),

    #[error("No surface registered for detector {0}")]
    UnknownSurface(DetId),

    #[error("Closest approach undefined: {0}")]
    ClosestApproachFailed(String),

    #[error("Event store failure: {0}")]
    EventStoreFailure(String),

    #[error("Product id was not reserved for this batch: {0}")]
    UnreservedProduct(&'static str),

    #[error("Dangling reference into {collection}: key {key}")]
    DanglingReference { collection: &'static str, key: usize },

    #[error("No {kind} registered under the name '{name}'")]
    ComponentNotFound { kind: &'static str, name: String },

    #[error("Invalid producer parameter: {0}")]
    InvalidProducerParameter(String),

    #[error("Unable to parse producer configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Batch finalization cancelled")]
    Cancelled,
}

impl PartialEq for TrackoutError {
    fn eq(&self, other: &Self) -> bool {
        use TrackoutError::*;
        match (self, other) {
            (FitFailed(a), FitFailed(b)) => a == b,
            (MalformedTrajectory(a), MalformedTrajectory(b)) => a == b,
            (MissingHit(a), MissingHit(b)) => a == b,
            (UnknownSurface(a), UnknownSurface(b)) => a == b,
            (ClosestApproachFailed(a), ClosestApproachFailed(b)) => a == b,
            (EventStoreFailure(a), EventStoreFailure(b)) => a == b,
            (UnreservedProduct(a), UnreservedProduct(b)) => a == b,
            (
                DanglingReference {
                    collection: c1,
                    key: k1,
                },
                DanglingReference {
                    collection: c2,
                    key: k2,
                },
            ) => c1 == c2 && k1 == k2,
            (
                ComponentNotFound { kind: k1, name: n1 },
                ComponentNotFound { kind: k2, name: n2 },
            ) => k1 == k2 && n1 == n2,
            (InvalidProducerParameter(a), InvalidProducerParameter(b)) => a == b,

            // Wrapped errors are not comparable: same variant is enough
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,

            (FitDeclined, FitDeclined) => true,
            (Cancelled, Cancelled) => true,

            _ => false,
        }
    }
}
