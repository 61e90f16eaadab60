//! SH-005: Step executor — runs steps strictly in authored order.
//!
//! Each step is resolved, bound, then applied. An unresolvable step or a
//! bind failure aborts the run. Operation failures abort too, except an
//! already-existing target, which is recorded and skipped. Completed steps
//! are never rolled back.

use super::collector::ErrorCollector;
use super::context::{GameIdentity, InstallContext, Scope};
use super::error::{InstallError, Severity};
use super::registry::CommandRegistry;
use super::types::{InstallEvent, RunResult, Step};
use crate::journal::eventlog;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Journal key for recipes that never named their game.
const UNNAMED_GAME: &str = "unnamed";

/// Appends events when the context has a journal directory.
struct Journal<'a> {
    dir: Option<&'a Path>,
    game: &'a str,
}

impl Journal<'_> {
    fn log(&self, event: InstallEvent) {
        if let Some(dir) = self.dir {
            if let Err(e) = eventlog::append_event(dir, self.game, event) {
                warn!(error = %e, "journal write failed");
            }
        }
    }
}

/// Execute `steps` for `game` against the context.
pub fn run(
    steps: &[Step],
    game: &GameIdentity,
    registry: &CommandRegistry,
    ctx: &InstallContext,
    collector: &mut ErrorCollector,
) -> RunResult {
    let start = Instant::now();
    let scope = Scope::new(game.clone(), ctx);
    let run_id = eventlog::generate_run_id();
    let journal_game = if game.slug.is_empty() {
        UNNAMED_GAME
    } else {
        game.slug.as_str()
    };
    let journal = Journal {
        dir: ctx.journal_dir.as_deref(),
        game: journal_game,
    };

    info!(game = journal_game, %run_id, steps = steps.len(), "install started");
    journal.log(InstallEvent::InstallStarted {
        game: journal_game.to_string(),
        run_id: run_id.clone(),
        steps: steps.len(),
        stagehand_version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let mut completed = 0usize;
    for step in steps {
        if ctx.is_cancelled() {
            info!(game = journal_game, completed, "install abandoned");
            journal.log(InstallEvent::InstallAbandoned {
                game: journal_game.to_string(),
                run_id,
                steps_completed: completed,
            });
            return RunResult::Abandoned { completed };
        }

        journal.log(InstallEvent::StepStarted {
            game: journal_game.to_string(),
            step: step.index,
            command: step.command.clone(),
        });
        let step_start = Instant::now();

        match execute_step(step, &scope, registry, ctx) {
            Ok(()) => {
                let duration = step_start.elapsed().as_secs_f64();
                debug!(%step, duration, "step completed");
                journal.log(InstallEvent::StepCompleted {
                    game: journal_game.to_string(),
                    step: step.index,
                    command: step.command.clone(),
                    duration_seconds: duration,
                });
                completed += 1;
            }
            Err(error) => {
                let fatal = error.severity() == Severity::Fatal;
                journal.log(InstallEvent::StepFailed {
                    game: journal_game.to_string(),
                    step: step.index,
                    command: step.command.clone(),
                    error: error.to_string(),
                    fatal,
                });
                collector.push(error.clone());
                if fatal {
                    warn!(%step, %error, "step failed, stopping");
                    return RunResult::Failed {
                        error,
                        errors: collector.to_vec(),
                    };
                }
                warn!(%step, %error, "step skipped");
                completed += 1;
            }
        }
    }

    let total = start.elapsed().as_secs_f64();
    info!(game = journal_game, completed, total, "install completed");
    journal.log(InstallEvent::InstallCompleted {
        game: journal_game.to_string(),
        run_id,
        steps_completed: completed,
        total_seconds: total,
    });
    RunResult::Succeeded { steps: completed }
}

/// Resolve, bind, and apply one step.
fn execute_step(
    step: &Step,
    scope: &Scope,
    registry: &CommandRegistry,
    ctx: &InstallContext,
) -> Result<(), InstallError> {
    let command = registry
        .resolve(&step.command)
        .map_err(|e| e.at_step(step.index, &step.command))?;
    let operation = command
        .bind(&step.params)
        .map_err(|e| e.at_step(step.index, &step.command))?;
    debug!(step = step.index, command = %operation.command(), "applying");
    operation
        .apply(scope, ctx)
        .map_err(|e| e.at_step(step.index, &step.command))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::fs::Filesystem;
    use crate::core::error::{FailureKind, ValidationError};
    use crate::core::parser::parse_recipe;
    use crate::journal::eventlog::read_events;
    use crate::testing::{FakeFilesystem, FakeRunner, MemoryStore};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn steps(yaml: &str) -> Vec<Step> {
        parse_recipe(yaml).unwrap().steps
    }

    fn game() -> GameIdentity {
        GameIdentity {
            slug: "baz".into(),
            name: "Baz".into(),
            runner: "linux".into(),
        }
    }

    #[test]
    fn test_sh005_runs_in_order() {
        let fs = FakeFilesystem::new().with_file("/tmp/a", b"a");
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store);
        let mut errors = ErrorCollector::new();
        let s = steps(
            "steps:\n  - mkdir: /g/one\n  - move: {src: /tmp/a, dst: /g/one/a}\n  - mkdir: /g/two\n",
        );

        let result = run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        assert_eq!(result, RunResult::Succeeded { steps: 3 });
        assert_eq!(
            fs.calls(),
            vec!["mkdir /g/one", "move /tmp/a -> /g/one/a", "mkdir /g/two"]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_sh005_fatal_stops_later_steps() {
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store);
        let mut errors = ErrorCollector::new();
        let s = steps(
            "steps:\n  - mkdir: /g/a\n  - move: {src: /tmp/missing, dst: /g/b}\n  - mkdir: /g/c\n",
        );

        let result = run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        match result {
            RunResult::Failed { error, errors: all } => {
                assert_eq!(error.step(), Some(1));
                assert!(matches!(
                    &error,
                    InstallError::Execution(e) if e.kind == FailureKind::NotFound
                ));
                assert_eq!(all.len(), 1);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(fs.calls(), vec!["mkdir /g/a", "move /tmp/missing -> /g/b"]);
        assert!(fs.exists(Path::new("/g/a")), "no rollback of completed steps");
    }

    #[test]
    fn test_sh005_already_exists_is_advisory() {
        let fs = FakeFilesystem::new().with_dir("/g/saves");
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store);
        let mut errors = ErrorCollector::new();
        let s = steps("steps:\n  - mkdir: /g/saves\n  - mkdir: /g/data\n");

        let result = run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        assert_eq!(result, RunResult::Succeeded { steps: 2 });
        assert_eq!(errors.len(), 1);
        assert!(!errors.has_fatal());
        assert!(fs.exists(Path::new("/g/data")));
    }

    #[test]
    fn test_sh005_unknown_command_aborts_without_rollback() {
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store);
        let mut errors = ErrorCollector::new();
        let s = steps("steps:\n  - mkdir: /g/a\n  - teleport: {}\n  - mkdir: /g/c\n");

        let result = run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        let RunResult::Failed { error, .. } = result else {
            panic!("expected failure");
        };
        assert_eq!(error.message(), "The command teleport does not exists");
        assert!(matches!(error, InstallError::Scripting(_)));
        assert!(fs.exists(Path::new("/g/a")));
        assert!(!fs.exists(Path::new("/g/c")));
    }

    #[test]
    fn test_sh005_failure_carries_earlier_errors() {
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store);
        let mut errors = ErrorCollector::new();
        errors.push(ValidationError::missing_field("name"));
        let s = steps("steps:\n  - move: {src: /nope, dst: /g/x}\n");

        let RunResult::Failed { errors: all, .. } =
            run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors)
        else {
            panic!("expected failure");
        };
        assert_eq!(all.len(), 2);
        assert!(matches!(all[0], InstallError::Validation(_)));
        assert!(matches!(all[1], InstallError::Execution(_)));
    }

    #[test]
    fn test_sh005_cancelled_before_first_step() {
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let flag = Arc::new(AtomicBool::new(true));
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_cancel_flag(flag);
        let mut errors = ErrorCollector::new();
        let s = steps("steps:\n  - mkdir: /g/a\n");

        let result = run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        assert_eq!(result, RunResult::Abandoned { completed: 0 });
        assert!(fs.calls().is_empty());
    }

    #[test]
    fn test_sh005_cancelled_between_steps_keeps_done_work() {
        let flag = Arc::new(AtomicBool::new(false));
        let fs = FakeFilesystem::new().cancelling(flag.clone());
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_cancel_flag(flag);
        let mut errors = ErrorCollector::new();
        let s = steps("steps:\n  - mkdir: /g/a\n  - mkdir: /g/b\n  - mkdir: /g/c\n");

        let result = run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        assert_eq!(result, RunResult::Abandoned { completed: 1 });
        assert_eq!(fs.calls(), vec!["mkdir /g/a"]);
        assert!(fs.exists(Path::new("/g/a")));
        assert!(!fs.exists(Path::new("/g/b")));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_sh005_journal_events() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_journal(dir.path());
        let mut errors = ErrorCollector::new();
        let s = steps("steps:\n  - mkdir: /g/a\n  - move: {src: /nope, dst: /g/b}\n");

        run(&s, &game(), &CommandRegistry::new(), &ctx, &mut errors);
        let events: Vec<_> = read_events(dir.path(), "baz")
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], InstallEvent::InstallStarted { steps: 2, .. }));
        assert!(matches!(events[2], InstallEvent::StepCompleted { step: 0, .. }));
        assert!(matches!(
            events[4],
            InstallEvent::StepFailed { step: 1, fatal: true, .. }
        ));
    }

    #[test]
    fn test_sh005_journal_unnamed_game() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_journal(dir.path());
        let mut errors = ErrorCollector::new();

        run(&[], &GameIdentity::default(), &CommandRegistry::new(), &ctx, &mut errors);
        assert_eq!(read_events(dir.path(), UNNAMED_GAME).unwrap().len(), 2);
    }
}
