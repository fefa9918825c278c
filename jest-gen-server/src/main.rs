use std::path::PathBuf;
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use jest_gen_core::model::generation_input::DEFAULT_NB_TRY;
use jest_gen_core::{append_line, GenError, GenerationInput, Generator, MarkovModel, NaiveBayes, StartSeed};

/// Upper bound for `/v1/sentences?count=`.
const MAX_COUNT: usize = 100;

/// Upper bound for `nb_try`, per requested sentence.
const MAX_NB_TRY: usize = 100_000;

/// Server configuration, from the command line or the environment.
#[derive(Parser, Debug)]
#[command(name = "jest-gen-server", about = "HTTP service generating funny sentences")]
struct Config {
	/// Address to bind.
	#[arg(long, env = "JEST_HOST", default_value = "127.0.0.1")]
	host: String,

	/// Port to bind.
	#[arg(long, env = "JEST_PORT", default_value_t = 5000)]
	port: u16,

	/// Directory holding `phrases.dat`, `funny.txt` and `not_funny.txt`.
	#[arg(long, env = "JEST_DATA_DIR", default_value = "./data")]
	data_dir: PathBuf,

	/// Default retry budget when a request does not give `nb_try`.
	#[arg(long, env = "JEST_NB_TRY", default_value_t = DEFAULT_NB_TRY)]
	nb_try: usize,
}

impl Config {
	fn corpus_path(&self) -> PathBuf {
		self.data_dir.join("phrases.dat")
	}

	fn label_path(&self, funny: bool) -> PathBuf {
		self.data_dir.join(if funny { "funny.txt" } else { "not_funny.txt" })
	}
}

/// Query parameters for the generation endpoints
#[derive(Deserialize)]
struct GenerateParams {
	seed: Option<String>,
	nb_try: Option<usize>,
	count: Option<usize>,
}

impl GenerateParams {
	/// Builds the generation input, falling back to the server defaults.
	fn generation_input(&self, default_nb_try: usize) -> Result<GenerationInput, GenError> {
		let nb_try = self.nb_try.unwrap_or(default_nb_try);
		if nb_try > MAX_NB_TRY {
			return Err(GenError::InvalidInput(format!("nb_try must be at most {MAX_NB_TRY}")));
		}
		let mut input = GenerationInput::new();
		input.set_nb_try(nb_try)?;
		input.start_seed = match self.seed.as_deref().map(str::trim) {
			None | Some("") => StartSeed::Random,
			Some(word) => StartSeed::Custom(word.to_owned()),
		};
		Ok(input)
	}
}

/// Body of `POST /v1/sentence`
#[derive(Deserialize)]
struct LabeledSentence {
	sentence: String,
	#[serde(alias = "wasFunny")]
	was_funny: bool,
}

/// Body of `POST /v1/phrase`
#[derive(Deserialize)]
struct Phrase {
	phrase: String,
}

#[derive(Serialize)]
struct SentenceBody {
	sentence: String,
}

#[derive(Serialize)]
struct SentencesBody {
	sentences: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Serialize, Deserialize)]
struct StatusBody {
	states: usize,
	num_funny: usize,
	num_not_funny: usize,
	vocab_size: usize,
	trained: bool,
}

struct SharedData {
	config: Config,
	model: MarkovModel,
	classifier: NaiveBayes,
}

impl SharedData {
	/// Loads whatever data already exists in the data directory.
	///
	/// Missing files are not an error: the service starts empty and is
	/// filled through `POST /v1/phrase` and `POST /v1/sentence`.
	fn load(config: Config) -> Result<Self, GenError> {
		std::fs::create_dir_all(&config.data_dir)?;

		let corpus = config.corpus_path();
		let model = if corpus.exists() {
			MarkovModel::new(&corpus)?
		} else {
			warn!("No corpus at {}, starting with an empty model", corpus.display());
			MarkovModel::default()
		};

		let mut classifier = NaiveBayes::new();
		for funny in [true, false] {
			let path = config.label_path(funny);
			if path.exists() {
				classifier.train_from_file(&path, funny)?;
			}
		}

		info!(
			"Loaded {} states, {} funny and {} not funny examples",
			model.len(),
			classifier.num_funny(),
			classifier.num_not_funny()
		);
		Ok(Self { config, model, classifier })
	}

	fn status(&self) -> StatusBody {
		StatusBody {
			states: self.model.len(),
			num_funny: self.classifier.num_funny(),
			num_not_funny: self.classifier.num_not_funny(),
			vocab_size: self.classifier.vocab_size(),
			trained: self.classifier.is_trained(),
		}
	}
}

type SharedState = web::Data<RwLock<SharedData>>;

/// Maps a core error to an HTTP response with a JSON body.
fn error_response(error: &GenError) -> HttpResponse {
	let body = ErrorBody { error: error.to_string() };
	match error {
		GenError::UnknownInitialState(_) => HttpResponse::NotFound().json(body),
		GenError::EmptyModel | GenError::Untrained => HttpResponse::Conflict().json(body),
		GenError::GenerationExhausted(_) => HttpResponse::ServiceUnavailable().json(body),
		GenError::InvalidInput(_) => HttpResponse::BadRequest().json(body),
		GenError::Io(_) | GenError::Cache(_) | GenError::Snapshot(_) => {
			HttpResponse::InternalServerError().json(body)
		}
	}
}

fn lock_failed() -> HttpResponse {
	HttpResponse::InternalServerError().json(ErrorBody { error: "Model lock failed".to_owned() })
}

fn bad_request(message: &str) -> HttpResponse {
	HttpResponse::BadRequest().json(ErrorBody { error: message.to_owned() })
}

/// Runs `generate` on the blocking thread pool, under the read lock.
///
/// Generation may try up to `MAX_NB_TRY` candidates per sentence, which
/// must not stall the async workers.
async fn run_generation<T, F>(data: SharedState, query: GenerateParams, generate: F) -> Result<T, HttpResponse>
where
	T: Send + 'static,
	F: FnOnce(&Generator<'_, NaiveBayes>, &GenerationInput) -> Result<T, GenError> + Send + 'static,
{
	let result = web::block(move || {
		let shared_data = data.read().ok()?;
		let generated = query.generation_input(shared_data.config.nb_try).and_then(|input| {
			let generator = Generator::new(&shared_data.model, &shared_data.classifier);
			generate(&generator, &input)
		});
		Some(generated)
	})
	.await;

	match result {
		Ok(Some(Ok(value))) => Ok(value),
		Ok(Some(Err(e))) => Err(error_response(&e)),
		Ok(None) => Err(lock_failed()),
		Err(_) => Err(HttpResponse::InternalServerError().json(ErrorBody { error: "Generation task failed".to_owned() })),
	}
}

/// HTTP GET endpoint `/v1/sentence`
///
/// Generates one sentence accepted by the classifier.
#[get("/v1/sentence")]
async fn get_sentence(data: SharedState, query: web::Query<GenerateParams>) -> impl Responder {
	match run_generation(data, query.into_inner(), |generator, input| generator.predict(input)).await {
		Ok(sentence) => HttpResponse::Ok().json(SentenceBody { sentence }),
		Err(response) => response,
	}
}

/// HTTP GET endpoint `/v1/sentences`
///
/// Generates `count` independent accepted sentences.
#[get("/v1/sentences")]
async fn get_sentences(data: SharedState, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(1);
	if count == 0 || count > MAX_COUNT {
		return bad_request(&format!("count must be between 1 and {MAX_COUNT}"));
	}

	let generated = run_generation(data, query.into_inner(), move |generator, input| {
		generator.predict_many(input, count)
	});
	match generated.await {
		Ok(sentences) => HttpResponse::Ok().json(SentencesBody { sentences }),
		Err(response) => response,
	}
}

/// HTTP POST endpoint `/v1/sentence`
///
/// Records a sentence judged by a user: it is appended to the matching
/// label file, then the classifier is trained on it.
#[post("/v1/sentence")]
async fn post_sentence(data: SharedState, body: web::Json<LabeledSentence>) -> impl Responder {
	if body.sentence.trim().is_empty() {
		return bad_request("Missing or empty sentence");
	}

	let mut shared_data = match data.write() {
		Ok(d) => d,
		Err(_) => return lock_failed(),
	};

	let path = shared_data.config.label_path(body.was_funny);
	if let Err(e) = append_line(&path, &body.sentence) {
		return error_response(&GenError::Io(e));
	}
	shared_data.classifier.train(&body.sentence, body.was_funny);

	HttpResponse::Ok().json(shared_data.status())
}

/// HTTP POST endpoint `/v1/phrase`
///
/// Adds a phrase to the corpus and trains the Markov model on it.
#[post("/v1/phrase")]
async fn post_phrase(data: SharedState, body: web::Json<Phrase>) -> impl Responder {
	if body.phrase.trim().is_empty() {
		return bad_request("Missing or empty phrase");
	}

	let mut shared_data = match data.write() {
		Ok(d) => d,
		Err(_) => return lock_failed(),
	};

	let corpus = shared_data.config.corpus_path();
	if let Err(e) = append_line(&corpus, &body.phrase) {
		return error_response(&GenError::Io(e));
	}
	shared_data.model.train(&body.phrase);

	// The corpus already holds the phrase, a stale cache would hide it
	if let Err(e) = shared_data.model.save_cache(&corpus) {
		warn!("Could not refresh the model cache: {e}");
		if let Err(e) = MarkovModel::clear_cache(&corpus) {
			warn!("Could not remove the stale model cache: {e}");
		}
	}

	HttpResponse::Ok().json(shared_data.status())
}

/// HTTP GET endpoint `/v1/model`
///
/// Returns the Markov model as `{"word": ["next", ...], ...}`.
#[get("/v1/model")]
async fn get_model(data: SharedState) -> impl Responder {
	match data.read() {
		Ok(shared_data) => HttpResponse::Ok().json(shared_data.model.snapshot()),
		Err(_) => lock_failed(),
	}
}

#[get("/v1/status")]
async fn get_status(data: SharedState) -> impl Responder {
	match data.read() {
		Ok(shared_data) => HttpResponse::Ok().json(shared_data.status()),
		Err(_) => lock_failed(),
	}
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_sentence)
		.service(get_sentences)
		.service(post_sentence)
		.service(post_phrase)
		.service(get_model)
		.service(get_status);
}

/// Main entry point for the server.
///
/// Loads the corpus and labeled examples from the data directory, wraps
/// them in a `RwLock` (generation reads, labeling writes) and starts an
/// Actix-web HTTP server.
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::parse();
	let address = (config.host.clone(), config.port);
	let shared_data = web::Data::new(RwLock::new(SharedData::load(config)?));

	info!("Listening on {}:{}", address.0, address.1);
	HttpServer::new(move || {
		let cors = Cors::default()
			.allow_any_origin()
			.allowed_methods(vec!["GET", "POST"])
			.allow_any_header();

		App::new()
			.wrap(Logger::default())
			.wrap(cors)
			.app_data(shared_data.clone())
			.configure(routes)
	})
		.bind(address)?
		.run()
		.await?;

	Ok(())
}
