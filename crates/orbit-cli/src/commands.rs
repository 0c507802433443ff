//! Subcommand implementations

use anyhow::{Context, Result};
use orbit_config::ConfigurationManager;
use orbit_core::{
    share, ConnectionPolicy, CycleSource, InputPort, ModelLoader, Nameservice, PeriodicActivity,
    TaskContext, TaskRef,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Options of the `run` subcommand
#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub(crate) name: String,
    pub(crate) cycles: u64,
    pub(crate) period: Option<Duration>,
    pub(crate) buffer: usize,
}

/// Deploy a cycle source, drive it and report every received cycle
///
/// Returns the final value of the task's counter.
pub(crate) async fn run(options: &RunOptions, mut on_cycle: impl FnMut(u64)) -> Result<u64> {
    let source = TaskContext::new(options.name.as_str(), CycleSource::new());
    let reader = InputPort::new("reader");
    let policy = match options.buffer {
        0 => ConnectionPolicy::Data,
        size => ConnectionPolicy::Buffer(size),
    };
    source.task().cycle_port().connect_to(&reader, policy);

    let typed = share(source);
    let names = Nameservice::local();
    names.register(&options.name, typed.clone())?;
    let task: TaskRef = names.resolve(&options.name)?;

    {
        let mut task = task.lock();
        task.configure()?;
        task.start()?;
    }

    match options.period {
        Some(period) => {
            let activity = PeriodicActivity::spawn(Arc::clone(&task), period);
            for _ in 0..options.cycles {
                on_cycle(reader.wait().await);
            }
            let triggers = activity.stop().await;
            tracing::debug!(triggers, "periodic activity stopped");
        }
        None => {
            for _ in 0..options.cycles {
                task.lock().trigger()?;
                reader.drain().into_iter().for_each(&mut on_cycle);
            }
        }
    }

    {
        let mut task = task.lock();
        task.stop()?;
        task.cleanup()?;
    }
    names.unregister(&options.name);

    let cycle = typed.lock().task().cycle();
    Ok(cycle)
}

/// Summary of a freshly deployed cycle source
pub(crate) fn describe(name: &str) -> String {
    TaskContext::new(name, CycleSource::new()).to_string()
}

/// Resolved configuration of a model as YAML
pub(crate) fn conf(
    models: Option<&Path>,
    dir: &Path,
    model: &str,
    sections: &[String],
    override_: bool,
) -> Result<String> {
    let loader = match models {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading task models from {}", path.display()))?;
            ModelLoader::from_yaml_str(&text)
                .with_context(|| format!("parsing task models from {}", path.display()))?
        }
        None => ModelLoader::with_builtin(),
    };

    let mut manager = ConfigurationManager::new(loader);
    manager.load_dir(dir)?;
    let conf = manager.resolve(model, sections, override_)?;
    Ok(serde_yaml::to_string(&conf)?)
}
