/// Upper bound on subject sampling, matching the aggregator extract sizes the
/// development workflow is meant for.
pub const MAX_SAMPLE: usize = 100;

/// Configuration for one transformation run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransformOptions {
    /// Cap on top-level subjects, sampled uniformly without replacement.
    /// Clamped to [`MAX_SAMPLE`].
    pub sample_size: Option<usize>,
    /// Cap on diagnosis records mapped per subject.
    pub diagnosis_limit: Option<usize>,
    /// Cap on file records mapped per subject.
    pub file_limit: Option<usize>,
    /// Run the file sub-mapping (DocumentReference/Group kinds).
    pub include_files: bool,
    /// Run the treatment sub-mapping (medication fan-out kinds).
    pub include_treatment: bool,
    /// Run the diagnosis sub-mapping (Condition and stage observations).
    pub include_condition: bool,
    /// Run the mutation sub-mapping (genomic observations).
    pub include_mutation: bool,
    /// Seed for the sampling RNG; a fixed seed makes sampling reproducible.
    pub seed: u64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            sample_size: None,
            diagnosis_limit: None,
            file_limit: None,
            include_files: false,
            include_treatment: true,
            include_condition: true,
            include_mutation: false,
            seed: 0,
        }
    }
}

impl TransformOptions {
    /// Clamp caps to their documented bounds.
    pub fn normalized(mut self) -> Self {
        if let Some(n) = self.sample_size {
            self.sample_size = Some(n.min(MAX_SAMPLE));
        }
        self
    }
}
