use serde::{Deserialize, Serialize};

/// Points in the lifecycle of a backend call at which progress is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Dispatched,
    Acknowledged,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStage {
    pub milestone: Milestone,
    pub message: String,
}

/// Ordered status texts shown while a submission is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPlan {
    pub stages: Vec<ProgressStage>,
}

impl ProgressPlan {
    pub fn messages_for(&self, milestone: Milestone) -> impl Iterator<Item = &str> {
        self.stages
            .iter()
            .filter(move |stage| stage.milestone == milestone)
            .map(|stage| stage.message.as_str())
    }
}

impl Default for ProgressPlan {
    fn default() -> Self {
        let stage = |milestone, message: &str| ProgressStage {
            milestone,
            message: message.to_string(),
        };
        Self {
            stages: vec![
                stage(Milestone::Dispatched, "Checking rates in your area..."),
                stage(Milestone::Dispatched, "Comparing top insurance providers..."),
                stage(Milestone::Acknowledged, "Your personalized quotes are ready!"),
                stage(
                    Milestone::Rejected,
                    "We couldn't reach our quoting service. Please try again.",
                ),
            ],
        }
    }
}
