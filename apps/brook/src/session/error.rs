use thiserror::Error;

/// Cause taxonomy for a failed media acquisition, mirroring the device and
/// permission failures a capture backend can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFault {
    MissingDevice,
    DeviceBusy,
    ConstraintsUnsatisfiable,
    PermissionDenied,
    MalformedRequest,
    Unknown,
}

impl MediaFault {
    pub fn explain(self) -> &'static str {
        match self {
            MediaFault::MissingDevice => "no capture device provides the requested tracks",
            MediaFault::DeviceBusy => "capture device is already in use",
            MediaFault::ConstraintsUnsatisfiable => {
                "capture device cannot satisfy the requested constraints"
            }
            MediaFault::PermissionDenied => "media capture permission was denied",
            MediaFault::MalformedRequest => "no media tracks were requested",
            MediaFault::Unknown => "unknown media failure",
        }
    }
}

#[derive(Debug, Error)]
#[error("media acquisition failed: {}", self.describe())]
pub struct MediaAcquisitionError {
    pub fault: MediaFault,
    pub detail: Option<String>,
}

impl MediaAcquisitionError {
    pub fn new(fault: MediaFault) -> Self {
        Self {
            fault,
            detail: None,
        }
    }

    pub fn with_detail(fault: MediaFault, detail: impl Into<String>) -> Self {
        Self {
            fault,
            detail: Some(detail.into()),
        }
    }

    fn describe(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {detail}", self.fault.explain()),
            None => self.fault.explain().to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[error("offer generation failed: {0}")]
pub struct OfferGenerationError(pub String);

#[derive(Debug, Error)]
#[error("answer application failed: {0}")]
pub struct AnswerApplicationError(pub String);

#[derive(Debug, Error)]
#[error("candidate application failed: {0}")]
pub struct CandidateApplicationError(pub String);
