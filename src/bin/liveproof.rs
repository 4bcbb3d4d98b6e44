//! LiveProof CLI - Command-line interface for LiveProof
//!
//! Commands:
//! - verify: Score verification requests (batch mode)
//! - stats: Print verifier diagnostics
//! - doctor: Diagnose artifact and environment health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use liveproof::{
    LogisticArtifact, VerificationRequest, VerificationResponse, Verifier, VerifierConfig,
    FEATURE_COUNT, LIVEPROOF_VERSION, SERVICE_NAME,
};

/// LiveProof - Human presence verification from behavioral telemetry
#[derive(Parser)]
#[command(name = "liveproof")]
#[command(version = LIVEPROOF_VERSION)]
#[command(about = "Score behavioral telemetry sessions as human or automated", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score verification requests (batch mode)
    Verify {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Trained artifact path (overrides LIVEPROOF_MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Fail if the trained artifact is missing
        #[arg(long)]
        require_model: bool,

        /// Session ID for records that do not carry one
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Print verifier diagnostics
    Stats {
        /// Trained artifact path (overrides LIVEPROOF_MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Diagnose artifact and environment health
    Doctor {
        /// Trained artifact path (overrides LIVEPROOF_MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one request per line)
    Ndjson,
    /// A single JSON request or an array of requests
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("liveproof=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), LiveproofCliError> {
    match cli.command {
        Commands::Verify {
            input,
            input_format,
            output_format,
            model,
            require_model,
            session_id,
        } => {
            let config = load_config(model).with_require_model(require_model);
            cmd_verify(
                &input,
                input_format,
                output_format,
                &config,
                session_id.as_deref(),
            )
        }

        Commands::Stats { model } => cmd_stats(&load_config(model)),

        Commands::Doctor { model, json } => cmd_doctor(&load_config(model), json),
    }
}

fn load_config(model: Option<PathBuf>) -> VerifierConfig {
    let config = VerifierConfig::from_env();
    match model {
        Some(path) => config.with_model_path(path),
        None => config,
    }
}

fn cmd_verify(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: &VerifierConfig,
    session_id: Option<&str>,
) -> Result<(), LiveproofCliError> {
    let input_data = read_input(input)?;

    let records = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => parse_json(&input_data)?,
    };

    if records.is_empty() {
        return Err(LiveproofCliError::NoRecords);
    }

    let verifier = Verifier::from_config(config)?;

    let responses: Vec<VerificationResponse> = records
        .into_iter()
        .map(|record| respond(&verifier, record, session_id))
        .collect();

    print!("{}", format_output(&responses, &output_format)?);

    check_failures(&responses)
}

fn cmd_stats(config: &VerifierConfig) -> Result<(), LiveproofCliError> {
    let verifier = Verifier::from_config(config)?;
    println!("{}", serde_json::to_string_pretty(&verifier.stats())?);
    Ok(())
}

fn cmd_doctor(config: &VerifierConfig, json: bool) -> Result<(), LiveproofCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("LiveProof version {}", LIVEPROOF_VERSION),
    });

    checks.push(DoctorCheck {
        name: "features".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} canonical features", FEATURE_COUNT),
    });

    let model_path = &config.model_path;
    let model_check = if !model_path.exists() {
        DoctorCheck {
            name: "model".to_string(),
            status: if config.require_model {
                CheckStatus::Error
            } else {
                CheckStatus::Warning
            },
            message: format!(
                "Artifact {} not found, rule-based scoring will be used",
                model_path.display()
            ),
        }
    } else {
        match LogisticArtifact::from_file(model_path) {
            Ok(artifact) => DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Artifact valid ({} model, accuracy {})",
                    artifact.model_type,
                    artifact
                        .metadata
                        .accuracy
                        .map(|a| format!("{:.2}", a))
                        .unwrap_or_else(|| "unknown".to_string())
                ),
            },
            Err(e) => DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid artifact: {}", e),
            },
        }
    };
    checks.push(model_check);

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        service: SERVICE_NAME.to_string(),
        version: LIVEPROOF_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("LiveProof Doctor Report");
        println!("=======================");
        println!("Service: {}", report.service);
        println!("Version: {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(LiveproofCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, LiveproofCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_ndjson(data: &str) -> Result<Vec<Value>, LiveproofCliError> {
    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line.trim()).map_err(|e| {
                LiveproofCliError::ParseError(format!("Line {}: {}", i + 1, e))
            })
        })
        .collect()
}

fn parse_json(data: &str) -> Result<Vec<Value>, LiveproofCliError> {
    match serde_json::from_str::<Value>(data)? {
        Value::Array(records) => Ok(records),
        record => Ok(vec![record]),
    }
}

/// Turn one input record into a response.
///
/// A record without `sessionId` or `features` keys is a bare feature map.
/// Missing session IDs come from `--session-id`, or a fresh UUID.
fn respond(verifier: &Verifier, record: Value, session_id: Option<&str>) -> VerificationResponse {
    let is_request = record.get("sessionId").is_some() || record.get("features").is_some();
    let record = if is_request {
        record
    } else {
        serde_json::json!({ "features": record })
    };

    let raw = record.to_string();
    match serde_json::from_value::<VerificationRequest>(record) {
        Ok(mut request) => {
            if request.session_id.is_none() {
                request.session_id = Some(
                    session_id
                        .map(str::to_string)
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                );
            }
            verifier.respond_request(request)
        }
        // Let the verifier report the parse failure with whatever ID it can recover
        Err(_) => verifier.respond(&raw),
    }
}

fn format_output(
    responses: &[VerificationResponse],
    format: &OutputFormat,
) -> Result<String, LiveproofCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for response in responses {
                lines.push(serde_json::to_string(response)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(responses)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(responses)? + "\n"),
    }
}

fn check_failures(responses: &[VerificationResponse]) -> Result<(), LiveproofCliError> {
    let failed = responses.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        Err(LiveproofCliError::RequestsFailed(failed))
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum LiveproofCliError {
    Io(io::Error),
    Verify(liveproof::VerifyError),
    Json(serde_json::Error),
    NoRecords,
    RequestsFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for LiveproofCliError {
    fn from(e: io::Error) -> Self {
        LiveproofCliError::Io(e)
    }
}

impl From<liveproof::VerifyError> for LiveproofCliError {
    fn from(e: liveproof::VerifyError) -> Self {
        LiveproofCliError::Verify(e)
    }
}

impl From<serde_json::Error> for LiveproofCliError {
    fn from(e: serde_json::Error) -> Self {
        LiveproofCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LiveproofCliError> for CliError {
    fn from(e: LiveproofCliError) -> Self {
        match e {
            LiveproofCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LiveproofCliError::Verify(e) => CliError {
                code: "VERIFIER_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'liveproof doctor' to check the trained artifact".to_string()),
            },
            LiveproofCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            LiveproofCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No verification requests found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            LiveproofCliError::RequestsFailed(count) => CliError {
                code: "REQUESTS_FAILED".to_string(),
                message: format!("{} requests failed verification", count),
                hint: Some("See the error records in the output".to_string()),
            },
            LiveproofCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            LiveproofCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    service: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveproof::{ErrorResponse, Feature};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn verified(response: VerificationResponse) -> liveproof::VerificationResult {
        match response {
            VerificationResponse::Verified(result) => result,
            VerificationResponse::Failed(e) => panic!("unexpected failure: {:?}", e),
        }
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let records = parse_ndjson("{\"sessionId\":\"a\"}\n\n  \n{\"sessionId\":\"b\"}\n").unwrap();

        assert_eq!(
            records,
            vec![json!({ "sessionId": "a" }), json!({ "sessionId": "b" })]
        );
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        match parse_ndjson("{\"sessionId\":\"a\"}\n\nnot json") {
            Err(LiveproofCliError::ParseError(msg)) => assert!(msg.starts_with("Line 3:")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_single_record_or_array() {
        let single = parse_json(r#"{"sessionId": "a", "features": {}}"#).unwrap();
        assert_eq!(single, vec![json!({ "sessionId": "a", "features": {} })]);

        let many = parse_json(r#"[{"sessionId": "a"}, {"sessionId": "b"}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1], json!({ "sessionId": "b" }));
    }

    #[test]
    fn test_bare_feature_map_is_wrapped() {
        let verifier = Verifier::rule_based();
        let record = json!({ "avg_reaction_time": 1800, "task_accuracy": 0.9 });

        let result = verified(respond(&verifier, record, Some("cli-session")));

        assert_eq!(result.session_id, "cli-session");
        assert_eq!(result.features.len(), 2);
        assert_eq!(result.features.value(Feature::AvgReactionTime), 1800.0);
        assert_eq!(result.features.value(Feature::TaskAccuracy), 0.9);
    }

    #[test]
    fn test_bare_feature_map_without_flag_gets_uuid() {
        let verifier = Verifier::rule_based();

        let result = verified(respond(&verifier, json!({ "avg_reaction_time": 1800 }), None));

        let id = Uuid::parse_str(&result.session_id).unwrap();
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn test_missing_session_id_filled_from_flag() {
        let verifier = Verifier::rule_based();

        let result = verified(respond(&verifier, json!({ "features": {} }), Some("flag-id")));

        assert_eq!(result.session_id, "flag-id");
        assert!((result.confidence - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_record_session_id_wins_over_flag() {
        let verifier = Verifier::rule_based();
        let record = json!({ "sessionId": "x", "features": {} });

        let result = verified(respond(&verifier, record, Some("flag-id")));

        assert_eq!(result.session_id, "x");
    }

    #[test]
    fn test_missing_features_is_error_record() {
        let verifier = Verifier::rule_based();

        let response = respond(&verifier, json!({ "sessionId": "y" }), Some("flag-id"));

        assert_eq!(
            response,
            VerificationResponse::Failed(ErrorResponse {
                error: "Missing required field: features".to_string(),
                session_id: Some("y".to_string()),
            })
        );
    }

    #[test]
    fn test_ndjson_output_and_failure_count() {
        let verifier = Verifier::rule_based();
        let responses = vec![
            respond(&verifier, json!({ "sessionId": "x", "features": {} }), None),
            respond(&verifier, json!({ "sessionId": "y" }), None),
        ];

        let output = format_output(&responses, &OutputFormat::Ndjson).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(output.ends_with('\n'));

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["sessionId"], json!("x"));
        assert_eq!(first["modelUsed"], json!("Rule-based"));

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(
            second,
            json!({ "error": "Missing required field: features", "sessionId": "y" })
        );

        match check_failures(&responses) {
            Err(e) => assert_eq!(CliError::from(e).code, "REQUESTS_FAILED"),
            Ok(()) => panic!("expected a failed batch"),
        }
        assert!(check_failures(&responses[..1]).is_ok());
    }

    #[test]
    fn test_json_output_is_array() {
        let verifier = Verifier::rule_based();
        let responses = vec![respond(&verifier, json!({ "features": {} }), Some("a"))];

        let output = format_output(&responses, &OutputFormat::Json).unwrap();
        let payload: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(payload.as_array().unwrap().len(), 1);
        assert_eq!(payload[0]["sessionId"], json!("a"));
    }
}
