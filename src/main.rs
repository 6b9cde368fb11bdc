use clap::{App, AppSettings, Arg};

mod logging;
use logging::ResultExt;

use bankStatementHelper::ai::{AiCollaborator, GeminiClient, NullCollaborator};
use bankStatementHelper::{process_statement, EmailContext, IdentityInput, PipelineConfig};

/// One JSON record per document: the canonical statement on success, a
/// `{"file", "error"}` object otherwise. An unreadable or unprocessable
/// document never aborts its siblings.
fn document_record(
    pdfname: &str,
    identity: &IdentityInput,
    email: &EmailContext,
    config: &PipelineConfig,
    ai: &dyn AiCollaborator,
) -> serde_json::Value {
    let result = std::fs::read(pdfname)
        .map_err(|e| format!("unable to read {}: {}", pdfname, e))
        .and_then(|data| process_statement(data, identity, email, config, ai, None, None));
    match result {
        Ok(statement) => serde_json::to_value(&statement)
            .expect_and_log("Error: unable to serialize statement"),
        Err(e) => {
            log::error!("{}: {}", pdfname, e);
            serde_json::json!({"file": pdfname, "error": e})
        }
    }
}

fn create_cmd_line_pattern<'a, 'b>(myapp: App<'a, 'b>) -> App<'a, 'b> {
    myapp
        .arg(
            Arg::with_name("name")
                .long("name")
                .help("Account holder's full name, used for password candidates")
                .takes_value(true)
                .default_value(""),
        )
        .arg(
            Arg::with_name("phone")
                .long("phone")
                .help("Registered phone number")
                .takes_value(true)
                .default_value(""),
        )
        .arg(
            Arg::with_name("dob")
                .long("dob")
                .help("Date of birth, digits only e.g. 17011999")
                .takes_value(true)
                .default_value(""),
        )
        .arg(
            Arg::with_name("bank")
                .long("bank")
                .help("Bank name hint e.g. HDFC, \"State Bank of India\"")
                .takes_value(true)
                .default_value(""),
        )
        .arg(
            Arg::with_name("sender")
                .long("sender")
                .help("Email sender address the statement arrived from")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("subject")
                .long("subject")
                .help("Email subject line the statement arrived with")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("max-candidates")
                .long("max-candidates")
                .help("Upper bound on generated password candidates")
                .takes_value(true)
                .default_value("200"),
        )
        .arg(
            Arg::with_name("limit-pages")
                .long("limit-pages")
                .help("Extract at most this many pages per document")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ocr")
                .long("ocr")
                .help("Request an OCR pass for scanned statements"),
        )
        .arg(
            Arg::with_name("pdf documents")
                .help("Bank statement PDF files")
                .multiple(true)
                .required(true),
        )
}

fn main() {
    logging::init_logging_infrastructure();

    let myapp = App::new("Bank statement helper").setting(AppSettings::ArgRequiredElseHelp);
    let matches = create_cmd_line_pattern(myapp).get_matches();

    let identity = IdentityInput {
        full_name: matches.value_of("name").unwrap_or_default().to_string(),
        phone: matches.value_of("phone").unwrap_or_default().to_string(),
        date_of_birth: matches.value_of("dob").unwrap_or_default().to_string(),
        bank_name: matches.value_of("bank").unwrap_or_default().to_string(),
    };
    let email = EmailContext {
        sender: matches.value_of("sender").map(str::to_string),
        subject: matches.value_of("subject").map(str::to_string),
    };
    let config = PipelineConfig {
        max_candidates: matches
            .value_of("max-candidates")
            .expect_and_log("error getting max-candidates value")
            .parse::<usize>()
            .expect_and_log("Error: max-candidates must be a number"),
        max_pages: matches
            .value_of("limit-pages")
            .map(|v| v.parse::<u32>().expect_and_log("Error: limit-pages must be a number")),
        force_ocr: matches.is_present("ocr"),
        user_id: None,
    };

    let ai: Box<dyn AiCollaborator> =
        match (std::env::var("GEMINI_ENDPOINT"), std::env::var("GEMINI_API_KEY")) {
            (Ok(endpoint), Ok(api_key)) => Box::new(
                GeminiClient::new(endpoint, api_key)
                    .expect_and_log("Error: unable to create AI client"),
            ),
            _ => {
                log::info!("GEMINI_ENDPOINT/GEMINI_API_KEY not set, AI structuring disabled");
                Box::new(NullCollaborator)
            }
        };

    let pdfnames = matches
        .values_of("pdf documents")
        .expect_and_log("error getting statement pdf names");

    log::info!("Started bankStatementHelper");

    pdfnames.for_each(|pdfname| {
        let record = document_record(pdfname, &identity, &email, &config, ai.as_ref());
        let json = serde_json::to_string_pretty(&record)
            .expect_and_log("Error: unable to serialize statement");
        println!("{}", json);
    });
}
