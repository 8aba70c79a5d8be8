// One-shot milestone thresholds over the cumulative install counter

#[derive(Debug, Clone)]
pub struct Milestone {
    pub threshold: u64,
    pub message: String,
    triggered: bool,
}

impl Milestone {
    pub fn new(threshold: u64, message: impl Into<String>) -> Self {
        Self {
            threshold,
            message: message.into(),
            triggered: false,
        }
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }
}

/// Static ascending milestone sequence. `triggered` transitions false→true
/// exactly once per threshold and never resets.
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    milestones: Vec<Milestone>,
}

impl MilestoneTracker {
    pub fn new(mut milestones: Vec<Milestone>) -> Self {
        milestones.sort_by_key(|m| m.threshold);
        Self { milestones }
    }

    /// The launch milestone table.
    pub fn standard() -> Self {
        Self::new(vec![
            Milestone::new(2_500, "Movement reaches critical mass"),
            Milestone::new(5_000, "Global recognition achieved"),
            Milestone::new(10_000, "Industry disruption confirmed"),
            Milestone::new(25_000, "New standard established"),
        ])
    }

    /// Mark and return every milestone newly crossed by `total_installs`,
    /// in ascending threshold order. A milestone fires at most once over
    /// the tracker's lifetime, no matter how often the same count is fed.
    pub fn crossings(&mut self, total_installs: u64) -> Vec<(u64, String)> {
        let mut fired = Vec::new();
        for m in &mut self.milestones {
            if !m.triggered && total_installs >= m.threshold {
                m.triggered = true;
                fired.push((m.threshold, m.message.clone()));
            }
        }
        fired
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }
}
