use clap::Parser;
use flowroute::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Syncs a flow-graph directory and compiles a route through it
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Working copy of the topology repository
    repository_dir: PathBuf,

    /// Root of the template catalog that `FS:///` template URIs resolve against
    #[arg(short, long)]
    templates: PathBuf,

    /// Source data node id
    #[arg(short, long)]
    source: String,

    /// Destination data node id
    #[arg(short, long)]
    destination: String,

    /// Name of the flow-graph directory inside the repository
    #[arg(long, default_value = "gobblin-flowgraph")]
    flowgraph_dir: String,

    /// Repository location reported in logs; defaults to the working copy path
    #[arg(long)]
    repository_uri: Option<String>,

    #[arg(long, default_value = "cli")]
    group: String,

    #[arg(long, default_value = "adhoc")]
    name: String,

    #[arg(long, default_value = "*")]
    input_format: String,

    #[arg(long, default_value = "*")]
    output_format: String,

    /// Write the compiled plan to this file (bincode)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep syncing and recompile after every poll interval
    #[arg(short, long)]
    watch: bool,

    /// Poll interval in seconds when watching
    #[arg(long, default_value_t = 60)]
    interval: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        exit_with_error(&e.to_string());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let repository_uri = cli
        .repository_uri
        .clone()
        .unwrap_or_else(|| format!("file://{}", cli.repository_dir.display()));
    let config = MonitorConfig::new(repository_uri, cli.repository_dir.clone())
        .with_flowgraph_dir(cli.flowgraph_dir.clone())
        .with_polling_interval(Duration::from_secs(cli.interval));

    let compiler = MultiHopCompiler::builder(config)
        .with_template_catalog(Arc::new(FsTemplateCatalog::new(cli.templates.clone())))
        .build()?;

    let sync_start = Instant::now();
    let report = compiler.monitor().poll_once().await;
    println!(
        "Synced flow graph in {:?}: {} applied, {} skipped, {} ignored",
        sync_start.elapsed(),
        report.applied(),
        report.skipped(),
        report.ignored()
    );
    println!(
        "Flow graph: {} node(s), {} edge(s)",
        compiler.flow_graph().node_count(),
        compiler.flow_graph().edge_count()
    );

    let spec = Spec::Flow(
        FlowSpec::new(&cli.group, &cli.name, &cli.source, &cli.destination)
            .with_input_format(&cli.input_format)
            .with_output_format(&cli.output_format),
    );

    if !cli.watch {
        let plan = compiler.compile(&spec)?;
        print_plan(&plan);
        if let Some(path) = &cli.output {
            plan.save(path)?;
            println!("Plan written to {}", path.display());
        }
        return Ok(());
    }

    compiler.set_active(true);
    compiler.start();
    let mut interval = tokio::time::interval(Duration::from_secs(cli.interval.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {
                match compiler.compile(&spec) {
                    Ok(plan) => {
                        print_plan(&plan);
                        if let Some(path) = &cli.output {
                            plan.save(path)?;
                        }
                    }
                    Err(e) => eprintln!("Compilation failed: {}", e),
                }
            }
        }
    }
    compiler.shutdown().await;
    println!(
        "Stopped. {} compilation(s) succeeded, {} failed",
        compiler.metrics().succeeded(),
        compiler.metrics().failed()
    );
    Ok(())
}

fn print_plan(plan: &PhysicalPlan) {
    println!("\n--- Physical Plan ({} hop(s)) ---", plan.len());
    for (index, hop) in plan.values().enumerate() {
        let capabilities: Vec<String> = hop
            .executor
            .capabilities
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{:>2}: {}\n    template: {}\n    executor: {} [{}]",
            index,
            hop.job_spec.uri,
            hop.job_spec.template_uri,
            hop.executor.class,
            capabilities.join(", ")
        );
    }
    println!("-----------------------------");
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
