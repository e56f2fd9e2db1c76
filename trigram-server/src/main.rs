use std::sync::LazyLock;

use actix_web::{App, HttpMessage, HttpRequest, HttpResponse, HttpServer, Responder, get, middleware, post, web};

use regex::Regex;
use serde::{Deserialize, Serialize};
use trigram_core::model::corpus::Corpus;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex"));
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z .,]").expect("hardcoded regex"));

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
}

/// JSON response of `/v1/generate`: a single generated sentence.
#[derive(Serialize, Deserialize)]
struct GenerateResp {
	sentence: String,
}

/// Cleans and normalises a body of raw text.
///
/// Evens out the whitespace by replacing each run with a single space,
/// then removes every character that is not a letter, space, comma or
/// full stop.
fn clean(raw: &str) -> String {
	let tidy = WHITESPACE.replace_all(raw, " ");
	DISALLOWED.replace_all(&tidy, "").into_owned()
}

/// HTTP POST endpoint `/v1/learn`
///
/// Accepts a stream of plain text, cleans it, and ingests it into the
/// shared corpus of learned text. Callers must send `text/plain`.
#[post("/v1/learn")]
async fn learn(data: web::Data<Corpus>, req: HttpRequest, body: web::Bytes) -> impl Responder {
	if req.content_type() != "text/plain" {
		return HttpResponse::BadRequest().body("Content-Type must be text/plain");
	}

	let text = String::from_utf8_lossy(&body);
	data.ingest(&clean(&text));
	HttpResponse::Ok().finish()
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a new sentence from the corpus and returns it as JSON.
/// Returns 400 in response to an empty corpus, indicating the caller
/// should first POST to `/v1/learn`.
#[get("/v1/generate")]
async fn generate(data: web::Data<Corpus>, query: web::Query<GenerateParams>) -> impl Responder {
	let length = query.length.unwrap_or(100);

	match data.generate(length) {
		Ok(words) => HttpResponse::Ok().json(GenerateResp {
			sentence: words.join(" "),
		}),
		Err(err) => {
			log::warn!("generate failed: {err}");
			// Must populate the corpus before generating
			HttpResponse::BadRequest().body(err.to_string())
		}
	}
}

/// Main entry point for the server.
///
/// The corpus is shared by every handler without an outer mutex: it is
/// internally thread-safe, so concurrent learn and generate requests
/// proceed in parallel.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let corpus = web::Data::new(Corpus::new());

	log::info!("listening on 127.0.0.1:8080");
	HttpServer::new(move || {
		App::new()
			.app_data(corpus.clone())
			.wrap(middleware::Logger::default())
			.service(learn)
			.service(generate)
	})
	.bind(("127.0.0.1", 8080))?
	.run()
	.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;

	macro_rules! service {
		() => {
			test::init_service(
				App::new()
					.app_data(web::Data::new(Corpus::new()))
					.service(learn)
					.service(generate),
			)
			.await
		};
	}

	#[::core::prelude::v1::test]
	fn clean_normalises_whitespace_and_strips_symbols() {
		assert_eq!(clean("The  cat\n\tsat!?"), "The cat sat");
		assert_eq!(clean("1 plus 2, some say."), " plus , some say.");
	}

	#[actix_web::test]
	async fn learn_rejects_non_plain_text() {
		let app = service!();

		let req = test::TestRequest::post()
			.uri("/v1/learn")
			.insert_header(("Content-Type", "application/json"))
			.set_payload("{}")
			.to_request();
		let resp = test::call_service(&app, req).await;

		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn generate_before_learn_is_a_bad_request() {
		let app = service!();

		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		let resp = test::call_service(&app, req).await;

		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn learn_then_generate_round_trip() {
		let app = service!();

		let req = test::TestRequest::post()
			.uri("/v1/learn")
			.insert_header(("Content-Type", "text/plain"))
			.set_payload("The cat\nsat on the mat. The dog sat on the rug.")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);

		let req = test::TestRequest::get()
			.uri("/v1/generate?length=1")
			.to_request();
		let resp: GenerateResp = test::call_and_read_body_json(&app, req).await;

		assert!(!resp.sentence.is_empty());
		assert!(resp.sentence.starts_with("The"));
	}
}
