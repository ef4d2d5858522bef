use pingwatch_core::{SamplingParams, Target};
use std::collections::HashMap;

/// What a config reload changes in the running monitor.
///
/// Samplers take their parameters once, at creation, so a target whose
/// parameters changed is stopped and started again (losing its history).
#[derive(Debug, Default, PartialEq)]
pub struct ReloadPlan {
    pub stop:  Vec<Target>,
    pub start: Vec<(Target, SamplingParams)>,
}

impl ReloadPlan {
    pub fn is_empty(&self) -> bool {
        self.stop.is_empty() && self.start.is_empty()
    }
}

/// Diff the running set of targets against the desired one.
pub fn plan(
    running: &HashMap<Target, SamplingParams>,
    desired: &[(Target, SamplingParams)],
) -> ReloadPlan {
    let wanted: HashMap<&Target, &SamplingParams> = desired.iter().map(|(t, p)| (t, p)).collect();

    let mut stop: Vec<Target> = running
        .iter()
        .filter(|(t, p)| wanted.get(t).map_or(true, |w| *w != *p))
        .map(|(t, _)| t.clone())
        .collect();
    stop.sort();

    let start = desired
        .iter()
        .filter(|(t, p)| running.get(t) != Some(p))
        .cloned()
        .collect();

    ReloadPlan { stop, start }
}
