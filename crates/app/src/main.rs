use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use services::{
    AnalysisBreakdownItem, AnalysisService, ApiClient, ApiConfig, Clock, ExternalDetector,
    HttpIdentityGateway, HttpQuestionSource, HttpResultBackend, LivenessCheck, LoginGate,
    QuizLoopService, QuizSession, StubAlwaysTrue,
};
use storage::question_bank::FileQuestionBank;
use storage::repository::{InMemoryResultStore, SessionResultStore};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--questions <path>] [--user <name>] [--skip-gate]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --questions questions.json");
    eprintln!("  --user student");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL   backend base URL (offline when unset)");
    eprintln!("  QUIZ_COOKIES        cookie header carrying the csrftoken");
    eprintln!("  QUIZ_QUESTIONS_FILE fallback questions file");
    eprintln!("  QUIZ_DETECTOR_PATH  liveness detector endpoint path");
}

struct Args {
    questions_file: String,
    user: String,
    skip_gate: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut questions_file = std::env::var("QUIZ_QUESTIONS_FILE")
            .unwrap_or_else(|_| "questions.json".to_string());
        let mut user = std::env::var("QUIZ_USER").unwrap_or_else(|_| "student".to_string());
        let mut skip_gate = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--questions" => questions_file = require_value(args, "--questions")?,
                "--user" => user = require_value(args, "--user")?,
                "--skip-gate" => skip_gate = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            questions_file,
            user,
            skip_gate,
        })
    }
}

fn prompt_line(prompt: &str) -> Result<String, std::io::Error> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// What the participant typed for a question.
enum Selection {
    Index(usize),
    Skip,
    Quit,
}

fn parse_selection(input: &str, options_len: usize) -> Option<Selection> {
    let input = input.trim();
    match input {
        "" => None,
        "s" | "skip" => Some(Selection::Skip),
        "q" | "quit" => Some(Selection::Quit),
        _ => {
            // Accept an option letter ("a", "B") or a 1-based number.
            if input.len() == 1 {
                let c = input.chars().next()?.to_ascii_uppercase();
                if c.is_ascii_uppercase() {
                    let index = (c as usize) - ('A' as usize);
                    return (index < options_len).then_some(Selection::Index(index));
                }
            }
            let number: usize = input.parse().ok()?;
            (1..=options_len)
                .contains(&number)
                .then_some(Selection::Index(number - 1))
        }
    }
}

fn option_letter(index: usize) -> char {
    char::from(b'A' + u8::try_from(index % 26).unwrap_or(0))
}

fn print_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();

    println!();
    println!(
        "Question {} of {}",
        session.current_index() + 1,
        progress.total
    );
    println!("{}", question.prompt());
    for (index, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", option_letter(index));
    }
}

async fn run_gate(args: &Args, config: &ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiClient::new(config);
    let liveness: Arc<dyn LivenessCheck> = match std::env::var("QUIZ_DETECTOR_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            Arc::new(ExternalDetector::new(api.clone(), path))
        }
        _ => Arc::new(StubAlwaysTrue),
    };

    let gate = LoginGate::new(
        Clock::default_clock(),
        Arc::new(HttpIdentityGateway::new(api.clone())),
        liveness,
    )
    .with_reporter(api);

    let password = prompt_line(&format!("Password for {}: ", args.user))?;
    gate.authorize(&args.user, &password).await?;
    println!("Login ok.");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = ApiConfig::from_env();
    if config.is_none() {
        tracing::info!("no backend configured, running against the local question file");
    }
    let clock = Clock::default_clock();
    let store = Arc::new(InMemoryResultStore::new());
    let file_bank = Arc::new(FileQuestionBank::new(&args.questions_file));

    if let Some(config) = &config {
        if !args.skip_gate {
            run_gate(&args, config).await?;
        }
    }

    let loop_svc = match &config {
        Some(config) => {
            let api = ApiClient::new(config);
            QuizLoopService::new(
                clock,
                Arc::new(HttpQuestionSource::new(api.clone())),
                Arc::clone(&store) as Arc<dyn SessionResultStore>,
            )
            .with_fallback(file_bank)
            .with_sink(Arc::new(HttpResultBackend::new(api)), args.user.clone())
        }
        None => QuizLoopService::new(
            clock,
            file_bank,
            Arc::clone(&store) as Arc<dyn SessionResultStore>,
        ),
    };

    let mut analysis = AnalysisService::new(Arc::clone(&store) as Arc<dyn SessionResultStore>);
    if let Some(config) = &config {
        let api = ApiClient::new(config);
        analysis = analysis.with_history(Arc::new(HttpResultBackend::new(api)));
    }

    let mut session = loop_svc.start_session().await?;
    println!(
        "Loaded {} questions. Answer with the option letter, 's' to skip, 'q' to quit.",
        session.questions().len()
    );

    while !session.is_complete() {
        print_question(&session);
        let options_len = session
            .current_question()
            .map(|q| q.options().len())
            .unwrap_or_default();

        let input = prompt_line("> ")?;
        match parse_selection(&input, options_len) {
            Some(Selection::Index(index)) => {
                let step = loop_svc.answer_current(&mut session, index).await?;
                if let Some(outcome) = step.outcome {
                    if outcome.is_correct {
                        println!("Correct!");
                    } else {
                        println!("Incorrect.");
                    }
                }
            }
            Some(Selection::Skip) => {
                loop_svc.skip_current(&mut session).await?;
                println!("Skipped.");
            }
            Some(Selection::Quit) => {
                println!("Leaving quiz.");
                return Ok(());
            }
            None => println!("Please answer with an option letter or number."),
        }
    }

    let result = analysis
        .load_result(session.id(), &args.user)
        .await?
        .ok_or("no result available")?;

    println!();
    println!("── Results ──────────────────────────────");
    println!(
        "Score: {}/{} ({}%)  incorrect: {}",
        result.score(),
        result.total(),
        result.percentage(),
        result.incorrect()
    );
    for item in AnalysisBreakdownItem::from_result(&result) {
        let mark = if item.is_correct { "✓" } else { "✗" };
        println!();
        println!("{mark} Question {}: {}", item.number, item.question);
        println!("  Your answer: {}", item.user_answer);
        if !item.is_correct {
            println!("  Correct answer: {}", item.correct_answer);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
