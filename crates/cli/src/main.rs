//! `lazydef` binary.
//!
//! - `check` validates component names against the configured rules
//! - `demo` walks a lazy definition through the in-memory document

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lazydef_dom::Document;
use lazydef_registry::{
	CallbackError, Constructor, ElementConstructor, ElementId, FlushMode, Generator, RegistryConfig, ResolutionError,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "lazydef")]
#[command(about = "Lazily defined component registry")]
#[command(version)]
struct Args {
	/// Registry configuration (TOML)
	#[arg(short, long, value_name = "FILE", global = true)]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Validate component names
	Check {
		/// Names to validate
		#[arg(required = true)]
		names: Vec<String>,
	},
	/// Run a lazy definition against an in-memory document
	Demo {
		/// Resolve the constructor through a future instead of synchronously
		#[arg(long)]
		deferred: bool,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => RegistryConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => RegistryConfig::default(),
	};
	debug!(?config, "config loaded");

	match args.command {
		Command::Check { names } => Ok(check(&config, &names)),
		Command::Demo { deferred } => demo(config, deferred).await,
	}
}

fn check(config: &RegistryConfig, names: &[String]) -> ExitCode {
	let mut ok = true;
	for name in names {
		match config.names.validate(name) {
			Ok(name) => println!("{name}: valid"),
			Err(reason) => {
				ok = false;
				println!("{name}: invalid ({reason})");
			}
		}
	}
	if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Prints each lifecycle callback it receives.
struct Announcer;

impl ElementConstructor for Announcer {
	fn construct(&self, element: ElementId) -> Result<(), CallbackError> {
		println!("  construct {element}");
		Ok(())
	}

	fn connected(&self, element: ElementId) {
		println!("  connected {element}");
	}

	fn disconnected(&self, element: ElementId) {
		println!("  disconnected {element}");
	}
}

const DEMO_NAME: &str = "lazy-demo";

async fn demo(config: RegistryConfig, deferred: bool) -> anyhow::Result<ExitCode> {
	let manual = config.flush == FlushMode::Manual;
	let doc = Document::with_runtime(config, tokio::runtime::Handle::current());
	let registry = doc.registry();

	let early = doc.create_element(DEMO_NAME);
	doc.append_child(doc.body(), early)?;
	println!("created {early} before definition: {:?}", doc.state(early));

	let generator = if deferred {
		Generator::deferred(|| async {
			tokio::task::yield_now().await;
			Ok::<Constructor, ResolutionError>(Arc::new(Announcer))
		})
	} else {
		Generator::ready(|| Arc::new(Announcer) as Constructor)
	};
	let waiter = registry.when_defined(DEMO_NAME)?;

	println!("define_lazy {DEMO_NAME}");
	registry.define_lazy(DEMO_NAME, generator)?;
	if manual {
		println!("flush");
		registry.flush();
	}

	waiter.await?;
	info!(name = DEMO_NAME, "defined");

	let late = doc.create_element(DEMO_NAME);
	println!("created {late} after definition: {:?}", doc.state(late));
	doc.append_child(doc.body(), late)?;
	doc.remove_child(doc.body(), early)?;

	for record in registry.snapshot() {
		println!("{}: {:?} {:?}", record.name, record.kind, record.status);
	}
	Ok(ExitCode::SUCCESS)
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("LAZYDEF_LOG")
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("lazydef_registry=trace,lazydef_dom=trace,lazydef=debug,info")
			} else {
				EnvFilter::new("warn")
			}
		});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
