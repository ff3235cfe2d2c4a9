// src/lib.rs

pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod matcher;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, TaskConfig};
use crate::config::validate::ensure_meta_task_is_free;
use crate::discovery::ScanDiscovery;
use crate::engine::{HostContext, MagicFactory, MagicTask, meta_task_name_from_env};
use crate::events::{EventKind, MagicEvent};
use crate::exec::{BuildExecutor, NodeRule, ProjectConfig, ShellExecutor};
use crate::matcher::path::dirname;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the shell executor with the static node rules
/// - one magic task per `[task.<name>]`, each scanning the project root
/// - the host context owning the top-level cache
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let factory = build_factory(&cfg, &root)?;

    let use_cache = cfg.config.use_cache && !args.no_cache;
    let host = Arc::new(HostContext::new(&root).with_cache(use_cache));

    let task_name = args
        .task
        .clone()
        .unwrap_or_else(|| factory.meta_task_name().to_string());
    info!(task = %task_name, targets = ?args.targets, use_cache, "running magic task");

    let built = factory.run_task(&task_name, &host, &args.targets).await?;

    for target in &built.built_targets {
        println!("{target}");
    }
    debug!(cached = host.cache().len(), "top-level cache after run");

    Ok(())
}

/// Build the factory described by `cfg`, scanning below `root`.
/// The meta task name is resolved once, from a non-blank `MAGIC_TASK`,
/// then `[config].meta_task`, then `__magic__`.
pub fn build_factory(cfg: &ConfigFile, root: &Path) -> Result<MagicFactory> {
    let meta = meta_task_name_from_env(cfg.config.meta_task.as_deref());
    build_factory_named(cfg, root, &meta)
}

/// [`build_factory`] with an explicit meta task name.
pub fn build_factory_named(cfg: &ConfigFile, root: &Path, meta: &str) -> Result<MagicFactory> {
    ensure_meta_task_is_free(cfg.task.keys(), meta)?;

    let mut project = ProjectConfig::new();
    for (path, rule) in cfg.node.iter() {
        project.node(path, NodeRule::new(&rule.cmd));
    }

    let executor: Arc<dyn BuildExecutor> = Arc::new(ShellExecutor::new(project));
    let mut factory = MagicFactory::new(executor).with_meta_task_name(meta);

    for (name, task_cfg) in cfg.task.iter() {
        let task = factory.create_task(name);
        configure_task(&task, task_cfg, root)?;
    }

    Ok(factory)
}

fn configure_task(task: &MagicTask, cfg: &TaskConfig, root: &Path) -> Result<()> {
    task.set_mode(cfg.mode);

    let mut scan = ScanDiscovery::new(root, &cfg.scan)?;
    if let Some(prepare) = &cfg.prepare {
        scan = scan.with_prepare(prepare);
    }
    task.prebuild(scan);

    if let Some(cmd) = cfg.build_cmd.clone() {
        task.configure(move |project, nodes, targets| {
            for node in nodes {
                if project.rule_for(node).is_none() {
                    project.node_if_absent(node, NodeRule::new(cmd.clone()));
                }
            }
            for target in targets {
                if project.rule_for(target).is_none() {
                    project.node_if_absent(dirname(target), NodeRule::new(cmd.clone()));
                }
            }
        });
    }

    let name = task.name().to_string();
    task.on(EventKind::Prebuild, move |event| {
        if let MagicEvent::Prebuild { nodes, targets } = event {
            info!(task = %name, nodes = nodes.len(), targets = targets.len(), "discovered");
        }
    });

    Ok(())
}

/// Directory the config file lives in, or the current directory for a bare
/// file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks and node rules.
fn print_dry_run(cfg: &ConfigFile) {
    println!("magicbuild dry-run");
    println!(
        "  meta task = {}",
        meta_task_name_from_env(cfg.config.meta_task.as_deref())
    );
    println!("  config.use_cache = {}", cfg.config.use_cache);
    println!();

    println!("nodes ({}):", cfg.node.len());
    for (path, rule) in cfg.node.iter() {
        println!("  - {path}");
        println!("      cmd: {}", rule.cmd);
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      mode: {}", task.mode);
        if let Some(ref prepare) = task.prepare {
            println!("      prepare: {prepare}");
        }
        if !task.scan.is_empty() {
            println!("      scan: {:?}", task.scan);
        }
        if let Some(ref cmd) = task.build_cmd {
            println!("      build_cmd: {cmd}");
        }
    }

    debug!("dry-run complete (nothing built)");
}
