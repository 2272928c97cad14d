use anyhow::Result;
use clap::Parser;
use colored::*;
use regex::Regex;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use termimad::MadSkin;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use voyage_common::{DEFAULT_SESSION_ID, VoyageConfig};
use voyage_core::llm::LLMService;
use voyage_core::{Capabilities, ModelProvider, ModelSelection, Session, TravelOrchestrator, UsageTracker};

/// Command-line arguments for the Voyage CLI
#[derive(Parser)]
#[command(name = "voyage", about = "Voyage - plan trips by chatting with a team of travel agents")]
pub struct Args {
    /// Model to start with (display name or key)
    #[clap(short, long)]
    model: Option<String>,

    /// Enable debug mode
    #[clap(short, long)]
    debug: bool,

    /// List available models and exit
    #[clap(long)]
    list_models: bool,
}

/// One line of REPL input
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Quit,
    Help,
    Reset,
    Models,
    Model(&'a str),
    Itinerary,
    Usage,
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(input: &'a str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            return Command::Quit;
        }
        let Some(rest) = input.strip_prefix('/') else {
            return Command::Message(input);
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name.to_lowercase().as_str() {
            "help" => Command::Help,
            "reset" => Command::Reset,
            "models" => Command::Models,
            "model" if !arg.is_empty() => Command::Model(arg),
            "model" => Command::Models,
            "itinerary" => Command::Itinerary,
            "usage" => Command::Usage,
            _ => Command::Unknown(input),
        }
    }
}

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid"));

/// Replace Markdown links with OSC 8 hyperlinks for supported terminals.
fn add_osc8_hyperlinks(input: &str) -> String {
    LINK_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let text = &caps[1];
            let url = &caps[2];
            format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
        })
        .to_string()
}

fn print_models(models: &ModelSelection, current: &str) {
    println!("{}", "🌍 Available models:".bright_cyan().bold());
    for (i, entry) in models.provider().entries().iter().enumerate() {
        let marker = if entry.display_name == current { "*" } else { " " };
        let availability = if models.provider().is_available(entry.key) {
            "".normal()
        } else {
            " (no API key)".bright_red()
        };
        println!(
            "{} {}. {} ({}){}",
            marker.bright_yellow(),
            (i + 1).to_string().bright_yellow(),
            entry.display_name.bright_green().bold(),
            entry.model_id.bright_blue(),
            availability
        );
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    println!("  {}            start a new conversation", "/reset".bright_yellow());
    println!("  {}           list models", "/models".bright_yellow());
    println!("  {}     switch model", "/model <name>".bright_yellow());
    println!("  {}        show the current itinerary", "/itinerary".bright_yellow());
    println!("  {}            token usage and recent traces", "/usage".bright_yellow());
    println!("  {}      leave", "quit | exit".bright_yellow());
}

/// Main conversation loop
async fn conversation_loop(orchestrator: &TravelOrchestrator, models: &ModelSelection) -> Result<()> {
    let skin = MadSkin::default();
    let mut session = Session::new(DEFAULT_SESSION_ID);

    println!(
        "{}",
        "💬 Tell me about the trip you have in mind. Type 'quit' or 'exit' to stop.".bright_green()
    );
    println!("{}", "Type '/help' for commands.".bright_yellow());
    println!();

    loop {
        print!("{}", "You: ".bright_cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match Command::parse(input) {
            Command::Quit => {
                println!("{}", "👋 Have a great trip!".bright_green());
                break;
            }
            Command::Help => print_help(),
            Command::Reset => {
                session = Session::new(DEFAULT_SESSION_ID);
                println!("{}", "🔄 Conversation reset.".bright_yellow());
            }
            Command::Models => print_models(models, &models.current().await.display_name),
            Command::Model(name) => match models.select(name).await {
                Ok(selected) => println!(
                    "{}",
                    format!("✅ Model changed to: {}", selected.display_name).bright_green()
                ),
                Err(e) => println!("{}", format!("❌ {}", e).red()),
            },
            Command::Itinerary => match session.itinerary() {
                Some(itinerary) => println!("{}", skin.term_text(&add_osc8_hyperlinks(&itinerary.to_markdown()))),
                None => println!("{}", "No itinerary yet.".bright_yellow()),
            },
            Command::Usage => {
                let report = orchestrator.tracker().format_report().await;
                println!("{}", skin.term_text(&report));
            }
            Command::Unknown(command) => {
                println!("{}", format!("❓ Unknown command: {}", command).red());
                print_help();
            }
            Command::Message(message) => {
                println!("{}", "✈️  Working on it...".bright_black());
                let model = models.current().await;
                let outcome = orchestrator.handle_message(&mut session, message, model).await;

                print!("{}", "Voyage: ".bright_green().bold());
                println!("{}", skin.term_text(&add_osc8_hyperlinks(&outcome.response)));
                if let Some(err) = &outcome.error {
                    println!("{}", format!("❌ Error: {}", err).red());
                }
                info!("State after turn: {}", outcome.state);
            }
        }

        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Setup tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = VoyageConfig::from_env().with_initial_model(args.model);
    let provider = ModelProvider::new(config.keys.clone());

    if args.list_models {
        print_models(&ModelSelection::new(provider, None)?, "");
        return Ok(());
    }

    let models = match ModelSelection::new(provider, config.initial_model.as_deref()) {
        Ok(models) => models,
        Err(e) => {
            error!("Failed to select model: {}", e);
            println!("{}", format!("❌ {}", e).red());
            return Ok(());
        }
    };

    let ai = Arc::new(LLMService::new(&config.keys));
    let capabilities = Capabilities::llm_backed(ai, &config.keys, Duration::from_secs(config.search_timeout_secs))?;
    let orchestrator = TravelOrchestrator::new(capabilities, UsageTracker::new(config.trace_capacity));

    let current = models.current().await;
    info!("Starting Voyage CLI with {}", current.display_name);
    println!(
        "{}",
        format!("🧭 Voyage travel agent ({})", current.display_name).bright_cyan().bold()
    );
    if !current.has_api_key() {
        println!(
            "{}",
            format!("⚠️  No API key configured for {}; set it in .env", current.provider).bright_red()
        );
    }

    if let Err(e) = conversation_loop(&orchestrator, &models).await {
        error!("Conversation error: {}", e);
        println!("{}", format!("❌ Conversation error: {}", e).red());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(Command::parse(" EXIT "), Command::Quit);
        assert_eq!(Command::parse("/reset"), Command::Reset);
        assert_eq!(Command::parse("/models"), Command::Models);
        assert_eq!(Command::parse("/model"), Command::Models);
        assert_eq!(
            Command::parse("/model Google Gemini 2.0 Flash (Free)"),
            Command::Model("Google Gemini 2.0 Flash (Free)")
        );
        assert_eq!(Command::parse("/itinerary"), Command::Itinerary);
        assert_eq!(Command::parse("/usage"), Command::Usage);
        assert_eq!(Command::parse("/teleport"), Command::Unknown("/teleport"));
        assert_eq!(
            Command::parse("Plan a 5-day trip to Paris"),
            Command::Message("Plan a 5-day trip to Paris")
        );
    }

    #[test]
    fn test_osc8_hyperlinks() {
        let out = add_osc8_hyperlinks("See [Louvre](https://louvre.fr) today");
        assert_eq!(out, "See \x1b]8;;https://louvre.fr\x1b\\Louvre\x1b]8;;\x1b\\ today");
        assert_eq!(add_osc8_hyperlinks("no links"), "no links");
    }
}
