use std::fmt;

use names_core::model::{
    ChatId, LearningMode, NameNumber, NamesPerDay, QuizMode, ReminderHour, SettingsPatch, UserId,
    UserProfile,
};
use services::quiz_service::DEFAULT_QUIZ_LENGTH;
use services::{BotServices, ChatTransport, Clock, QuizAnswer, QuizQuestion};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod console;

use console::ConsoleTransport;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- progress [common]");
    eprintln!("  cargo run -p app -- learn    [common]");
    eprintln!("  cargo run -p app -- quiz     [common] [--length <n>]");
    eprintln!("  cargo run -p app -- mark     [common] --name <1-99>");
    eprintln!("  cargo run -p app -- settings [common] [--pace <1-99>] [--quiz-mode multiple_choice|free_recall]");
    eprintln!("                               [--learning-mode sequential|random] [--reminders on|off]");
    eprintln!("                               [--reminder-hour <0-23>]");
    eprintln!("  cargo run -p app -- remind   [common]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>      default sqlite://names.sqlite3");
    eprintln!("  --catalog <path>       default data/names.json");
    eprintln!("  --user <id>            default 1");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  NAMES_DB_URL, NAMES_CATALOG, NAMES_USER_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Progress,
    Learn,
    Quiz,
    Mark,
    Settings,
    Remind,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "progress" => Some(Self::Progress),
            "learn" => Some(Self::Learn),
            "quiz" => Some(Self::Quiz),
            "mark" => Some(Self::Mark),
            "settings" => Some(Self::Settings),
            "remind" => Some(Self::Remind),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    catalog: String,
    user: UserId,
    length: usize,
    name: Option<NameNumber>,
    patch: SettingsPatch,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("NAMES_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://names.sqlite3".into(), normalize_sqlite_url);
        let mut catalog =
            std::env::var("NAMES_CATALOG").unwrap_or_else(|_| "data/names.json".into());
        let mut user = std::env::var("NAMES_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(|| UserId::new(1));
        let mut length = DEFAULT_QUIZ_LENGTH;
        let mut name = None;
        let mut patch = SettingsPatch::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => catalog = require_value(args, "--catalog")?,
                "--user" => user = parse_value(args, "--user")?,
                "--length" => length = parse_value(args, "--length")?,
                "--name" => name = Some(parse_value(args, "--name")?),
                "--pace" => {
                    let raw = require_value(args, "--pace")?;
                    let pace = raw
                        .parse()
                        .ok()
                        .and_then(|value| NamesPerDay::new(value).ok())
                        .ok_or(ArgsError::InvalidValue { flag: "--pace", raw })?;
                    patch = patch.with_names_per_day(pace);
                }
                "--quiz-mode" => {
                    patch = patch.with_quiz_mode(parse_value::<QuizMode>(args, "--quiz-mode")?);
                }
                "--learning-mode" => {
                    patch = patch
                        .with_learning_mode(parse_value::<LearningMode>(args, "--learning-mode")?);
                }
                "--reminders" => {
                    let raw = require_value(args, "--reminders")?;
                    let enabled = match raw.as_str() {
                        "on" => Some(true),
                        "off" => Some(false),
                        _ => None,
                    };
                    let enabled = enabled.ok_or(ArgsError::InvalidValue {
                        flag: "--reminders",
                        raw,
                    })?;
                    patch = patch.with_reminders_enabled(enabled);
                }
                "--reminder-hour" => {
                    let raw = require_value(args, "--reminder-hour")?;
                    let hour = raw
                        .parse()
                        .ok()
                        .and_then(|value| ReminderHour::new(value).ok())
                        .ok_or(ArgsError::InvalidValue {
                            flag: "--reminder-hour",
                            raw,
                        })?;
                    patch = patch.with_reminder_hour(hour);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog,
            user,
            length,
            name,
            patch,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Map a typed line to an answer for the question on screen.
fn parse_answer(question: &QuizQuestion, input: &str) -> Option<QuizAnswer> {
    let expected = question.name.number;
    match question.mode {
        QuizMode::FreeRecall => match input.to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(QuizAnswer::recalled(expected, true)),
            "n" | "no" => Some(QuizAnswer::recalled(expected, false)),
            _ => None,
        },
        QuizMode::MultipleChoice => {
            let mut chars = input.chars();
            let letter = chars.next()?.to_ascii_uppercase();
            if chars.next().is_some() || !letter.is_ascii_uppercase() {
                return None;
            }
            let index = usize::from(letter as u8 - b'A');
            question
                .options
                .get(index)
                .map(|option| QuizAnswer::choice(expected, option.number))
        }
    }
}

async fn run_quiz(
    services: &BotServices,
    transport: &dyn ChatTransport,
    chat: ChatId,
    user: UserId,
    length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz();
    let mut question = quiz.start_and_show(chat, user, length, transport).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(line) = lines.next_line().await? else {
            quiz.abandon(chat);
            return Ok(());
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            quiz.abandon(chat);
            println!("Quiz abandoned.");
            return Ok(());
        }
        let Some(answer) = parse_answer(&question, input) else {
            eprintln!("answer with a letter, y/n in free recall, or q to quit");
            continue;
        };
        let outcome = quiz.answer_and_show(chat, user, answer, transport).await?;
        match outcome.next {
            Some(next) => question = next,
            None => return Ok(()),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: show progress when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Progress,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Progress,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = BotServices::new_sqlite(&parsed.db_url, &parsed.catalog, Clock::system()).await?;

    let user = parsed.user;
    if services.users().get_user(user).await?.is_none() {
        services
            .users()
            .ensure_user(user, UserProfile::default())
            .await?;
        tracing::info!(user = %user, "user registered");
    }

    let transport = ConsoleTransport::new();
    // A user's private chat shares the user's id.
    let chat = ChatId::new(user.value());

    match cmd {
        Command::Progress => {
            let reply = services.progress_reply(user).await?;
            transport.send_message(chat, &reply).await?;
        }
        Command::Learn => {
            let reply = services.learn_today(user).await?;
            transport.send_message(chat, &reply).await?;
        }
        Command::Quiz => run_quiz(&services, &transport, chat, user, parsed.length).await?,
        Command::Mark => {
            let number = parsed
                .name
                .ok_or(ArgsError::MissingValue { flag: "--name" })?;
            services.progress().mark_learned(user, number).await?;
            tracing::info!(user = %user, name = %number, "marked learned");
            let reply = services.progress_reply(user).await?;
            transport.send_message(chat, &reply).await?;
        }
        Command::Settings => {
            let reply = services.update_settings(user, parsed.patch).await?;
            transport.send_message(chat, &reply).await?;
        }
        Command::Remind => {
            let sent = services.send_due_reminders(&transport).await?;
            println!("{sent} reminder(s) sent");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
