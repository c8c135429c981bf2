mod config;
mod display;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};

use wickr_core::differ::create_plan;
use wickr_core::effect::Effect;
use wickr_core::resource::Resource;
use wickr_core::schemas;
use wickr_stack::WickrStack;
use wickr_state::{Operation, StateBackend, StateFile, create_backend};

use config::{DEFAULT_CONFIG_FILE, ProjectConfig};
use display::{print_outputs, print_plan, print_resource_summary, print_template_diff};

#[derive(Parser)]
#[command(name = "wickr")]
#[command(about = "Declare and deploy a Wickr Enterprise stack", long_about = None)]
struct Cli {
    /// Project configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Deploy-time parameter (key=value), overrides the config file
    #[arg(short, long = "parameter", global = true)]
    parameters: Vec<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the template
    Synth {
        /// Print the template instead of writing it
        #[arg(long)]
        stdout: bool,
    },
    /// Resolve parameters and check every resource against its schema
    Validate,
    /// Show what apply would change
    Plan,
    /// Write the template and record the declaration
    Apply {
        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Remove every recorded resource
    Destroy {
        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Release a lock left by an interrupted command
    ForceUnlock {
        lock_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match ProjectConfig::load(&cli.config) {
        Ok(config) => match cli.command {
            Commands::Synth { stdout } => run_synth(&config, stdout),
            Commands::Validate => run_validate(&config, &cli.parameters),
            Commands::Plan => run_plan(&config, &cli.parameters).await,
            Commands::Apply { auto_approve } => {
                run_apply(&config, &cli.parameters, auto_approve).await
            }
            Commands::Destroy { auto_approve } => run_destroy(&config, auto_approve).await,
            Commands::ForceUnlock { lock_id } => run_force_unlock(&config, &lock_id).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_stack(config: &ProjectConfig) -> Result<WickrStack, String> {
    WickrStack::build(&config.stack_props()).map_err(|e| format!("Build error: {}", e))
}

/// Build the stack and resolve its parameters. Fails before anything is
/// written when a script or a required parameter is missing.
fn resolve(config: &ProjectConfig, overrides: &[String]) -> Result<(WickrStack, Vec<Resource>), String> {
    let stack = build_stack(config)?;
    let supplied = config.supplied_parameters(overrides)?;
    let resources = stack
        .resolve(&supplied)
        .map_err(|e| format!("Parameter error: {}", e))?;
    Ok((stack, resources))
}

fn run_synth(config: &ProjectConfig, stdout: bool) -> Result<(), String> {
    let stack = build_stack(config)?;
    let template = stack
        .synth()
        .map_err(|e| format!("Synthesis error: {}", e))?;

    if stdout {
        println!("{}", template);
        return Ok(());
    }

    let path = config.template_path();
    let previous = fs::read_to_string(&path).ok();
    write_template(&path, &template)?;

    println!(
        "{}",
        format!("✓ Synthesized {} to {}", stack.name, path.display())
            .green()
            .bold()
    );
    print_resource_summary(stack.graph().resources());
    print_outputs(stack.outputs());

    if let Some(previous) = previous.filter(|p| p != &template) {
        println!();
        println!("{}", "Template changes:".cyan().bold());
        print_template_diff(&previous, &template);
    }
    Ok(())
}

fn run_validate(config: &ProjectConfig, overrides: &[String]) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let (stack, resources) = resolve(config, overrides)?;
    stack
        .template()
        .to_json()
        .map_err(|e| format!("Synthesis error: {}", e))?;

    let errors = schemas::lint(&resources);
    if !errors.is_empty() {
        let lines: Vec<_> = errors.iter().map(|e| format!("  {}", e)).collect();
        return Err(format!("Validation failed:\n{}", lines.join("\n")));
    }

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len())
            .green()
            .bold()
    );
    print_resource_summary(&resources);
    Ok(())
}

async fn run_plan(config: &ProjectConfig, overrides: &[String]) -> Result<(), String> {
    let (_, resources) = resolve(config, overrides)?;
    let backend = create_backend(&config.backend_config())
        .await
        .map_err(|e| format!("Backend error: {}", e))?;

    let lock = backend
        .acquire_lock(Operation::Plan)
        .await
        .map_err(|e| format!("Failed to acquire lock: {}", e))?;
    let result = plan_locked(backend.as_ref(), config, &resources).await;
    release(backend.as_ref(), &lock).await;
    result
}

async fn plan_locked(
    backend: &dyn StateBackend,
    config: &ProjectConfig,
    resources: &[Resource],
) -> Result<(), String> {
    let state = read_state(backend, config).await?;
    let current = state
        .states()
        .map_err(|e| format!("Failed to read state: {}", e))?;
    print_plan(&create_plan(resources, &current));
    Ok(())
}

async fn run_apply(
    config: &ProjectConfig,
    overrides: &[String],
    auto_approve: bool,
) -> Result<(), String> {
    let (stack, resources) = resolve(config, overrides)?;
    let template = stack
        .synth()
        .map_err(|e| format!("Synthesis error: {}", e))?;
    let backend = create_backend(&config.backend_config())
        .await
        .map_err(|e| format!("Backend error: {}", e))?;

    let lock = backend
        .acquire_lock(Operation::Apply)
        .await
        .map_err(|e| format!("Failed to acquire lock: {}", e))?;
    let result = apply_locked(backend.as_ref(), config, &stack, &resources, &template, auto_approve).await;
    release(backend.as_ref(), &lock).await;
    result
}

async fn apply_locked(
    backend: &dyn StateBackend,
    config: &ProjectConfig,
    stack: &WickrStack,
    resources: &[Resource],
    template: &str,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = read_state(backend, config).await?;
    let current = state
        .states()
        .map_err(|e| format!("Failed to read state: {}", e))?;

    let plan = create_plan(resources, &current);
    print_plan(&plan);
    if plan.is_empty() {
        return Ok(());
    }
    if !auto_approve && !confirm("Do you want to apply these changes?")? {
        println!("{}", "Apply cancelled.".yellow());
        return Ok(());
    }

    write_template(&config.template_path(), template)?;
    state.record(resources);
    state.increment_serial();
    backend
        .write_state(&state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))?;
    info!("recorded {} resources at serial {}", resources.len(), state.serial);

    let summary = plan.summary();
    println!();
    println!(
        "{}",
        format!(
            "Apply complete! Resources: {} added, {} changed, {} destroyed.",
            summary.create, summary.update, summary.delete
        )
        .green()
        .bold()
    );
    println!("Template written to {}", config.template_path().display());
    print_outputs(stack.outputs());
    Ok(())
}

async fn run_destroy(config: &ProjectConfig, auto_approve: bool) -> Result<(), String> {
    let backend = create_backend(&config.backend_config())
        .await
        .map_err(|e| format!("Backend error: {}", e))?;

    let lock = backend
        .acquire_lock(Operation::Destroy)
        .await
        .map_err(|e| format!("Failed to acquire lock: {}", e))?;
    let result = destroy_locked(backend.as_ref(), config, auto_approve).await;
    release(backend.as_ref(), &lock).await;
    result
}

async fn destroy_locked(
    backend: &dyn StateBackend,
    config: &ProjectConfig,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = read_state(backend, config).await?;
    if state.resources.is_empty() {
        println!("{}", "No resources recorded.".yellow());
        return Ok(());
    }
    let current = state
        .states()
        .map_err(|e| format!("Failed to read state: {}", e))?;

    // Nothing declared: every recorded resource is deleted, dependents first
    let plan = create_plan(&[], &current);
    print_plan(&plan);
    if !auto_approve
        && !confirm("Do you really want to destroy all resources? This cannot be undone.")?
    {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    for effect in plan.effects() {
        if let Effect::Delete(id) = effect {
            debug!("removing {} from state", id);
            state.remove_resource(id);
        }
    }
    state.increment_serial();
    backend
        .write_state(&state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))?;

    println!();
    println!(
        "{}",
        format!(
            "Destroy complete! {} resources destroyed.",
            plan.summary().delete
        )
        .green()
        .bold()
    );
    Ok(())
}

async fn run_force_unlock(config: &ProjectConfig, lock_id: &str) -> Result<(), String> {
    let backend = create_backend(&config.backend_config())
        .await
        .map_err(|e| format!("Backend error: {}", e))?;
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| format!("Failed to unlock: {}", e))?;
    println!("{}", format!("✓ Lock {} released.", lock_id).green().bold());
    Ok(())
}

/// Recorded state, or a fresh one on first use. A state recorded for
/// another stack is refused.
async fn read_state(backend: &dyn StateBackend, config: &ProjectConfig) -> Result<StateFile, String> {
    let state = backend
        .read_state()
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?;

    match state {
        Some(state) if state.stack_name != config.stack_name => Err(format!(
            "State belongs to stack '{}', not '{}'",
            state.stack_name, config.stack_name
        )),
        Some(state) => Ok(state),
        None => Ok(StateFile::new(&config.stack_name)),
    }
}

async fn release(backend: &dyn StateBackend, lock: &wickr_state::LockInfo) {
    if let Err(e) = backend.release_lock(lock).await {
        eprintln!(
            "{} failed to release lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
}

fn write_template(path: &Path, template: &str) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }
    fs::write(path, template).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn confirm(question: &str) -> Result<bool, String> {
    println!();
    println!("{}", question.bold());
    print!("  Only 'yes' will be accepted: ");
    io::stdout()
        .flush()
        .map_err(|e| format!("Failed to flush stdout: {}", e))?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|e| format!("Failed to read input: {}", e))?;
    Ok(answer.trim() == "yes")
}
