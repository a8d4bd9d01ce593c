use anyhow::{Context as _, Result};
use clap::Parser;
use contextflow::config::RunConfig;
use contextflow::errors::ContextflowError;
use contextflow::logging::{init_logging, LogFormat};
use contextflow::parser::ParserKind;
use contextflow::pipeline::{run_pipeline, PipelineRunner};
use contextflow::version::get_version;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Run a pipeline of steps over a shared, interpolated context
#[derive(Parser, Debug)]
#[command(name = "contextflow", version, about, long_about = None)]
struct Cli {
    /// Name of the pipeline to run, without the .yaml extension
    pipeline: String,

    /// Argument handed to the context parser
    context: Option<String>,

    /// Context parser: keyvaluepairs, list, json or string
    #[arg(short, long)]
    parser: Option<ParserKind>,

    /// Directory holding pipeline files
    #[arg(short, long, default_value = "pipelines")]
    dir: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.pipeline)
            .with_pipelines_dir(&self.dir)
            .with_log_level(&self.log_level);
        if let Some(arg) = &self.context {
            config = config.with_context_arg(arg);
        }
        if let Some(parser) = self.parser {
            config = config.with_parser(parser);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(&cli.log_level, format);
    debug!(version = %get_version(), "starting");

    match run(&cli.config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(hint) = err
                .downcast_ref::<ContextflowError>()
                .and_then(ContextflowError::fix_hint)
            {
                eprintln!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RunConfig) -> Result<()> {
    let runner = PipelineRunner::default();
    let (summary, _) = run_pipeline(config, &runner)
        .with_context(|| format!("pipeline '{}' failed", config.pipeline))?;
    debug!(run_id = %summary.run_id, steps = summary.steps_run.len(), "done");
    Ok(())
}
