//! Scripted Event Replay
//!
//! Applies [`ScenarioEvent`]s to a [`ResourceState`] by name. A failing event
//! is recorded and the script continues, the same way an interactive caller
//! would report the error and carry on with the next operation.

use serde::Serialize;

use crate::domain::{
    Classification, EngineError, EngineResult, ProcessId, RecoveryManager, RequestProtocol,
    ResourceState, Victim,
};
use crate::infrastructure::ScenarioEvent;

/// Successful effect of one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum StepEffect {
    /// Units granted or released
    Applied,
    /// Banker's request granted; completion order of the new state
    Granted {
        /// Completion order after the grant
        completion_order: Vec<ProcessId>,
    },
    /// A process was terminated
    Terminated {
        /// The victim
        victim: Victim,
    },
    /// Auto-recovery found no deadlock
    NothingToRecover,
    /// Current classification
    Classified {
        /// Result of the safety check
        classification: Classification,
    },
}

/// Outcome of one replayed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    /// Position in the script
    pub index: usize,
    /// The event as scripted
    pub event: ScenarioEvent,
    /// What happened
    #[serde(serialize_with = "serialize_result")]
    pub result: Result<StepEffect, EngineError>,
}

impl ReplayStep {
    /// Whether the event succeeded
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn serialize_result<S>(result: &Result<StepEffect, EngineError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(1))?;
    match result {
        Ok(effect) => map.serialize_entry("ok", effect)?,
        Err(err) => map.serialize_entry("error", &err.to_string())?,
    }
    map.end()
}

/// Drives a state through an event script
pub struct Replayer<'a> {
    state: &'a mut ResourceState,
}

impl<'a> Replayer<'a> {
    /// Replay against `state`
    pub fn new(state: &'a mut ResourceState) -> Self {
        Self { state }
    }

    /// Apply every event in order, collecting per-event outcomes
    pub fn run(&mut self, events: &[ScenarioEvent]) -> Vec<ReplayStep> {
        events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let result = self.apply(event);
                if let Err(err) = &result {
                    tracing::debug!(index, error = %err, "event failed");
                }
                ReplayStep {
                    index,
                    event: event.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Apply a single event
    pub fn apply(&mut self, event: &ScenarioEvent) -> EngineResult<StepEffect> {
        match event {
            ScenarioEvent::Grant { process, units } => {
                let id = self.state.index_of(process)?;
                self.state.grant(id, units)?;
                Ok(StepEffect::Applied)
            }
            ScenarioEvent::Release { process, units } => {
                let id = self.state.index_of(process)?;
                self.state.release(id, units)?;
                Ok(StepEffect::Applied)
            }
            ScenarioEvent::Request { process, units } => {
                let id = self.state.index_of(process)?;
                let outcome = self.state.request_safely(id, units)?;
                Ok(StepEffect::Granted {
                    completion_order: outcome.completion_order,
                })
            }
            ScenarioEvent::Terminate { process } => {
                let victim = self.state.terminate_by_name(process)?;
                Ok(StepEffect::Terminated { victim })
            }
            ScenarioEvent::AutoRecover => {
                let deadlocked = self.state.classify().deadlocked;
                Ok(match RecoveryManager::auto_recover(self.state, &deadlocked)? {
                    Some(victim) => StepEffect::Terminated { victim },
                    None => StepEffect::NothingToRecover,
                })
            }
            ScenarioEvent::Classify => Ok(StepEffect::Classified {
                classification: self.state.classify(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, Snapshot};

    fn state() -> ResourceState {
        ResourceState::setup(Snapshot::new(
            vec!["A".into(), "B".into()],
            vec!["R".into()],
            vec![vec![1], vec![1]],
            vec![vec![2], vec![3]],
            vec![1],
        ))
        .unwrap()
    }

    fn grant(p: &str, n: u64) -> ScenarioEvent {
        ScenarioEvent::Grant {
            process: p.into(),
            units: vec![n],
        }
    }

    #[test]
    fn test_failed_step_does_not_stop_script() {
        let mut s = state();
        let steps = Replayer::new(&mut s).run(&[
            grant("A", 5),
            grant("Nobody", 1),
            grant("B", 1),
            ScenarioEvent::Classify,
        ]);
        assert_eq!(steps.len(), 4);
        assert_eq!(
            steps[0].result.as_ref().unwrap_err().kind(),
            ErrorKind::OverAllocation
        );
        assert_eq!(
            steps[1].result.as_ref().unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(steps[2].is_ok());
        match &steps[3].result {
            Ok(StepEffect::Classified { classification }) => {
                assert_eq!(classification.deadlocked, vec![ProcessId(0), ProcessId(1)]);
            }
            other => panic!("unexpected step result: {other:?}"),
        }
        assert_eq!(s.available(), &[0]);
        assert!(s.is_conserved());
    }

    #[test]
    fn test_auto_recover_and_terminate_events() {
        let mut s = state();
        let mut replayer = Replayer::new(&mut s);
        replayer.apply(&grant("B", 1)).unwrap();

        let effect = replayer.apply(&ScenarioEvent::AutoRecover).unwrap();
        match effect {
            StepEffect::Terminated { victim } => assert_eq!(victim.name, "B"),
            other => panic!("unexpected effect: {other:?}"),
        }
        assert_eq!(
            replayer.apply(&ScenarioEvent::AutoRecover).unwrap(),
            StepEffect::NothingToRecover
        );
        let effect = replayer
            .apply(&ScenarioEvent::Terminate {
                process: "A".into(),
            })
            .unwrap();
        assert!(matches!(effect, StepEffect::Terminated { .. }));
        assert_eq!(s.available(), &[3]);
    }

    #[test]
    fn test_request_event_uses_bankers_check() {
        let mut s = state();
        let steps = Replayer::new(&mut s).run(&[
            ScenarioEvent::Request {
                process: "B".into(),
                units: vec![1],
            },
            ScenarioEvent::Release {
                process: "A".into(),
                units: vec![1],
            },
            ScenarioEvent::Request {
                process: "B".into(),
                units: vec![1],
            },
        ]);
        assert_eq!(
            steps[0].result.as_ref().unwrap_err().kind(),
            ErrorKind::Unsafe
        );
        assert!(steps[1].is_ok());
        assert!(matches!(steps[2].result, Ok(StepEffect::Granted { .. })));
    }

    #[test]
    fn test_steps_serialize() {
        let mut s = state();
        let steps = Replayer::new(&mut s).run(&[grant("A", 9), ScenarioEvent::Classify]);
        let json = serde_json::to_value(&steps).unwrap();
        assert!(json[0]["result"]["error"].as_str().unwrap().contains("requested 9"));
        assert_eq!(json[1]["result"]["ok"]["effect"], "classified");
    }
}
