use std::{fs, path::PathBuf};

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use braid_config::Config;
use braid_ingest::{DocumentFormat, ExtractOptions};
use braid_service::{BlendedResult, RetrievalEngine};

#[derive(Debug, Parser)]
#[command(
	version = braid_cli::VERSION,
	rename_all = "kebab",
	styles = braid_cli::styles(),
)]
pub struct Args {
	/// TOML configuration. Built-in defaults (local backend) when omitted.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub document: PathBuf,
	/// Document format: text, pdf, docx or csv. Detected from the file extension when omitted.
	#[arg(long, value_name = "FORMAT", value_parser = parse_format)]
	pub format: Option<DocumentFormat>,
	#[arg(long, short = 'q', value_name = "TEXT")]
	pub query: String,
	#[arg(long, value_name = "N")]
	pub top_k: Option<u32>,
	/// Vector share of the blend, from 0.0 (lexical only) to 1.0 (vector only).
	#[arg(long, value_name = "W", value_parser = parse_weight)]
	pub weight: Option<f32>,
	/// Answer text to score against the retrieved context.
	#[arg(long, value_name = "FILE")]
	pub answer: Option<PathBuf>,
	/// Model priced from `[pricing]` when estimating the cost of answering.
	#[arg(long, value_name = "NAME", requires = "answer")]
	pub model: Option<String>,
	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
	pub query: String,
	pub backend: String,
	pub top_k: usize,
	pub weight: f32,
	pub chunks: usize,
	pub results: Vec<BlendedResult>,
	pub context: String,
	pub context_tokens: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub grounding: Option<GroundingReport>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GroundingReport {
	pub citation_count: usize,
	pub answer_length: usize,
	pub grounding_coverage: f32,
	pub answer_tokens: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cost_usd: Option<f64>,
}
impl GroundingReport {
	pub fn new(answer: &str, context: &str) -> Self {
		Self {
			citation_count: braid_service::citation_count(answer),
			answer_length: braid_service::answer_length(answer),
			grounding_coverage: braid_service::grounding_coverage(answer, context),
			answer_tokens: braid_service::token_estimate(answer),
			cost_usd: None,
		}
	}

	/// Prices the prompt (`query` plus `context`) as input and the answer as output.
	pub fn with_cost(mut self, config: &Config, model: &str, query: &str, context: &str) -> Self {
		let prompt_tokens =
			braid_service::token_estimate(query) + braid_service::token_estimate(context);

		self.cost_usd = Some(braid_service::cost_estimate(
			&config.pricing,
			model,
			model,
			prompt_tokens,
			self.answer_tokens,
		));

		self
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = match args.config.as_ref() {
		Some(path) => braid_config::load(path)?,
		None => Config::default(),
	};

	init_tracing(&config);

	let opts = ExtractOptions { csv_max_rows: config.ingest.csv_max_rows as usize };
	let text = braid_ingest::extract_file(&args.document, args.format, &opts)?;
	let answer = args.answer.as_ref().map(fs::read_to_string).transpose()?;
	let output = search(&config, &args, &text, answer.as_deref()).await?;

	if args.json {
		let json = serde_json::to_string_pretty(&output)?;

		println!("{json}");

		return Ok(());
	}

	print!("{}", output.context);

	if let Some(report) = output.grounding.as_ref() {
		println!(
			"citations={} words={} coverage={:.3} tokens={}",
			report.citation_count,
			report.answer_length,
			report.grounding_coverage,
			report.answer_tokens
		);

		if let Some(cost) = report.cost_usd {
			println!("cost_usd={cost:.6}");
		}
	}

	Ok(())
}

/// Indexes `text` with the configured chunking and runs one query against it.
pub async fn search(
	config: &Config,
	args: &Args,
	text: &str,
	answer: Option<&str>,
) -> color_eyre::Result<SearchOutput> {
	let top_k = args.top_k.unwrap_or(config.retrieval.top_k) as usize;
	let weight = args.weight.unwrap_or(config.retrieval.vector_weight);
	let mut engine = RetrievalEngine::from_config(config).await?;
	let chunks = engine
		.index(text, config.chunking.chunk_size as usize, config.chunking.overlap as usize)
		.await?
		.len();
	let results = engine.search(&args.query, top_k, weight).await?;
	let context = braid_service::format_context(&results);

	tracing::info!(chunks, results = results.len(), top_k, weight, "Query answered.");

	Ok(SearchOutput {
		query: args.query.clone(),
		backend: engine.backend().kind().to_string(),
		top_k,
		weight,
		chunks,
		context_tokens: braid_service::token_estimate(&context),
		grounding: answer.map(|answer| {
			let report = GroundingReport::new(answer, &context);

			match args.model.as_deref() {
				Some(model) => report.with_cost(config, model, &args.query, &context),
				None => report,
			}
		}),
		results,
		context,
	})
}

fn parse_weight(raw: &str) -> Result<f32, String> {
	let weight: f32 = raw.trim().parse().map_err(|err| format!("Invalid weight: {err}."))?;

	if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
		return Err("Weight must be a number in the range 0.0-1.0.".to_string());
	}

	Ok(weight)
}

fn parse_format(raw: &str) -> Result<DocumentFormat, String> {
	DocumentFormat::parse(raw)
		.ok_or_else(|| format!("Unsupported format {raw:?}; expected text, pdf, docx or csv."))
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	// Stdout carries results only.
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
