use std::path::PathBuf;

use clap::Parser;
use log::info;

use rs_markov_core::io::{document_path_for, load_document, read_text, save_document};
use rs_markov_core::model::DEFAULT_DEPTH;
use rs_markov_core::{Generator, MarkovChain};

/// Learns from text files and prints generated sentences.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Text files to learn from.
	inputs: Vec<PathBuf>,

	/// Chain depth (>= 3). Higher values stick closer to the source text.
	#[arg(short, long, default_value_t = DEFAULT_DEPTH)]
	depth: usize,

	/// Number of sentences to print.
	#[arg(short, long, default_value_t = 10)]
	count: usize,

	/// Seed for reproducible output.
	#[arg(short, long)]
	seed: Option<u64>,

	/// Document to load before learning (`.json` or binary).
	#[arg(short, long)]
	load: Option<PathBuf>,

	/// Where to save the learned model. Without a value, next to the first
	/// input as `.json`.
	#[arg(long, num_args = 0..=1)]
	save: Option<Option<PathBuf>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Args::parse();

	// The depth of a loaded document must match `--depth`
	let mut chain = MarkovChain::new(args.depth)?;
	if let Some(path) = &args.load {
		chain.import_document(&load_document(path)?)?;
		info!("loaded {}", path.display());
	}

	for input in &args.inputs {
		let learned = chain.feed(&read_text(input)?);
		info!("{}: {} sentences", input.display(), learned);
	}

	if let Some(save) = &args.save {
		let path = match (save, args.inputs.first()) {
			(Some(path), _) => path.clone(),
			(None, Some(input)) => document_path_for(input)?,
			(None, None) => return Err("--save needs a path when no input is given".into()),
		};
		save_document(&chain.export_document(), &path)?;
		println!("Model saved to {}", path.display());
	}

	if !chain.is_ready() {
		println!("Nothing learned yet: feed text with complete sentences.");
		return Ok(());
	}

	let mut generator = match args.seed {
		Some(seed) => Generator::from_seed(seed),
		None => Generator::from_os_rng(),
	};

	for i in 0..args.count {
		println!("Generated sentence {}: {}", i + 1, generator.generate(&chain)?);
	}

	Ok(())
}
