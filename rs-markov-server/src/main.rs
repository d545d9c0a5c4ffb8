use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, delete, get, post, put, web};

use clap::Parser;
use log::{error, info, warn};
use serde::Deserialize;

use rs_markov_core::io::load_document;
use rs_markov_core::{Generator, MarkovChain, MarkovError, TreeDocument};

/// HTTP front-end over a single shared Markov chain.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Config {
	/// Address to bind.
	#[arg(long, env = "MARKOV_BIND", default_value = "127.0.0.1")]
	bind: String,

	/// Port to listen on.
	#[arg(long, env = "MARKOV_PORT", default_value_t = 5000)]
	port: u16,

	/// Chain depth (>= 3).
	#[arg(long, env = "MARKOV_DEPTH", default_value_t = rs_markov_core::model::DEFAULT_DEPTH)]
	depth: usize,

	/// Document to load at startup (`.json` or binary).
	#[arg(long, env = "MARKOV_MODEL")]
	model: Option<PathBuf>,

	/// Seed for reproducible generation.
	#[arg(long, env = "MARKOV_SEED")]
	seed: Option<u64>,
}

/// Most sentences a single `/v1/generate` request may ask for.
const MAX_SENTENCES_PER_REQUEST: usize = 1000;

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
}

impl GenerateParams {
	/// Requested sentence count, clamped to `1..=MAX_SENTENCES_PER_REQUEST`.
	fn count(&self) -> usize {
		self.count.unwrap_or(1).clamp(1, MAX_SENTENCES_PER_REQUEST)
	}
}

/// The chain is only mutated under the write lock; generations share the read lock.
struct SharedData {
	chain: RwLock<MarkovChain>,
	generator: Mutex<Generator>,
}

/// HTTP GET endpoint `/v1/generate`
///
/// Returns `count` generated sentences (default 1, at most
/// [`MAX_SENTENCES_PER_REQUEST`]), one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count();

	let chain = match data.chain.read() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let mut generator = match data.generator.lock() {
		Ok(g) => g,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	match generator.generate_many(&chain, count) {
		Ok(sentences) => HttpResponse::Ok().body(sentences.join("\n")),
		Err(MarkovError::NotReady) => HttpResponse::Conflict().body("Model has not learned any sentence yet"),
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

#[get("/v1/ready")]
async fn get_ready(data: web::Data<SharedData>) -> impl Responder {
	match data.chain.read() {
		Ok(chain) => HttpResponse::Ok().body(chain.is_ready().to_string()),
		Err(_) => HttpResponse::InternalServerError().body("Model lock failed"),
	}
}

/// HTTP POST endpoint `/v1/train`
///
/// The body is raw text; responds with the number of sentences learned.
#[post("/v1/train")]
async fn post_train(data: web::Data<SharedData>, body: String) -> impl Responder {
	let mut chain = match data.chain.write() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let learned = chain.feed(&body);
	HttpResponse::Ok().body(learned.to_string())
}

#[get("/v1/export")]
async fn get_export(data: web::Data<SharedData>) -> impl Responder {
	let chain = match data.chain.read() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(chain.export_document())
}

/// HTTP PUT endpoint `/v1/import`
///
/// Merges a JSON tree document into the current chain.
#[put("/v1/import")]
async fn put_import(data: web::Data<SharedData>, document: web::Json<TreeDocument>) -> impl Responder {
	let mut chain = match data.chain.write() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match chain.import_document(&document) {
		Ok(_) => HttpResponse::Ok().body("Model imported successfully"),
		Err(e) => {
			warn!("rejected document: {e}");
			HttpResponse::BadRequest().body(e.to_string())
		}
	}
}

#[delete("/v1/model")]
async fn delete_model(data: web::Data<SharedData>) -> impl Responder {
	let mut chain = match data.chain.write() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let depth = chain.depth();
	match MarkovChain::new(depth) {
		Ok(fresh) => {
			*chain = fresh;
			HttpResponse::Ok().body("Model cleared")
		}
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// Builds the initial chain from the configuration.
fn initial_chain(config: &Config) -> Result<MarkovChain, MarkovError> {
	let mut chain = MarkovChain::new(config.depth)?;
	if let Some(path) = &config.model {
		chain.import_document(&load_document(path)?)?;
		info!("loaded {} ({} tokens)", path.display(), chain.len());
	}
	Ok(chain)
}

/// Main entry point for the server.
///
/// Builds (or loads) the chain, wraps it for shared access and starts an
/// Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let config = Config::parse();

	let chain = initial_chain(&config).map_err(|e| {
		error!("cannot build model: {e}");
		std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
	})?;
	let generator = match config.seed {
		Some(seed) => Generator::from_seed(seed),
		None => Generator::from_os_rng(),
	};

	let shared_data = web::Data::new(SharedData {
		chain: RwLock::new(chain),
		generator: Mutex::new(generator),
	});

	info!("listening on {}:{}", config.bind, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.app_data(web::PayloadConfig::new(16 * 1024 * 1024))
			.app_data(web::JsonConfig::default().limit(64 * 1024 * 1024))
			.service(get_generated)
			.service(get_ready)
			.service(post_train)
			.service(get_export)
			.service(put_import)
			.service(delete_model)
	})
		.bind((config.bind.as_str(), config.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generate_count_is_clamped() {
		let count = |count| GenerateParams { count }.count();
		assert_eq!(count(None), 1);
		assert_eq!(count(Some(0)), 1);
		assert_eq!(count(Some(25)), 25);
		assert_eq!(count(Some(usize::MAX)), MAX_SENTENCES_PER_REQUEST);
	}
}
