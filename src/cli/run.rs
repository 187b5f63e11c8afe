use log::{debug, info, warn};

use super::args::{Args, Command, QuestionAction};
use crate::{
    client::{ChatSession, ConsoleRenderer, QuestionList, RelayClient, TurnOutcome},
    core::{Config, RelayError},
    providers::{GeminiClient, UpstreamClient},
    server,
};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn load_config(args: &Args) -> Result<Config, RelayError> {
    match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

pub async fn run(args: Args) -> Result<(), RelayError> {
    let _ = dotenv::dotenv();

    let mut config = load_config(&args)?;
    debug!("[SETTINGS] {config:?}");

    match args.command {
        Command::Serve { bind } => {
            config.override_bind(bind);
            let upstream: Arc<dyn UpstreamClient> =
                Arc::new(GeminiClient::from_env(config.upstream.clone())?);
            info!("Using upstream model {}", config.upstream.model);
            server::serve(&config, upstream).await
        }
        Command::Chat { endpoint } => {
            config.override_endpoint(endpoint);
            chat(&config).await
        }
        Command::Ask { endpoint, query } => {
            config.override_endpoint(endpoint);
            ask(&config, &query.join(" ")).await
        }
        Command::Questions { action } => questions(&config, action),
    }
}

async fn ask(config: &Config, query: &str) -> Result<(), RelayError> {
    let client = RelayClient::from_config(&config.client);
    let mut session = ChatSession::new();
    let mut renderer = ConsoleRenderer::new(io::stdout());

    let outcome = client
        .run_turn(&mut session, query, |message| {
            if let Err(e) = renderer.render(message) {
                warn!("Failed to render message: {e}");
            }
        })
        .await;

    match outcome {
        TurnOutcome::Completed => Ok(()),
        TurnOutcome::Rejected => Err(RelayError::InvalidInput(
            "Query must not be empty".to_string(),
        )),
        TurnOutcome::Failed => Err(RelayError::Transport(format!(
            "Request to {} failed",
            config.client.endpoint
        ))),
    }
}

async fn chat(config: &Config) -> Result<(), RelayError> {
    let client = RelayClient::from_config(&config.client);
    let questions = QuestionList::load(&config.client.questions_path);
    let mut session = config
        .client
        .greeting
        .as_ref()
        .map_or_else(ChatSession::new, |greeting| ChatSession::with_greeting(greeting.as_str()));
    let mut renderer = ConsoleRenderer::new(io::stdout()).hide_user();

    for message in session.messages() {
        renderer.render(message)?;
    }
    println!("Type a question, /questions, /ask <n>, or /quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        let input = match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/questions", _) => {
                print_questions(&questions);
                continue;
            }
            ("/ask", position) => match position.trim().parse().ok().and_then(|n| questions.get(n)) {
                Some(text) => {
                    println!("> {text}");
                    text
                }
                None => {
                    println!("No such question. Use /questions to list them.");
                    continue;
                }
            },
            _ => line.to_string(),
        };

        let outcome = client
            .run_turn(&mut session, &input, |message| {
                if let Err(e) = renderer.render(message) {
                    warn!("Failed to render message: {e}");
                }
            })
            .await;
        debug!("[Chat] turn finished: {outcome:?}");
    }

    Ok(())
}

fn print_questions(questions: &QuestionList) {
    for (position, question) in questions.all().iter().enumerate() {
        let marker = if QuestionList::is_default(&question.id) {
            String::new()
        } else {
            format!("  (id {})", question.id)
        };
        println!("{:>2}. {}{marker}", position + 1, question.text);
    }
}

fn questions(config: &Config, action: QuestionAction) -> Result<(), RelayError> {
    let mut questions = QuestionList::load(&config.client.questions_path);

    match action {
        QuestionAction::List => print_questions(&questions),
        QuestionAction::Add { text } => {
            let question = questions.add(&text.join(" "))?;
            println!("Added question {}: {}", question.id, question.text);
        }
        QuestionAction::Remove { id } => {
            if questions.remove(&id)? {
                println!("Removed question {id}");
            } else if QuestionList::is_default(&id) {
                println!("Built-in questions cannot be removed");
            } else {
                println!("No custom question with id {id}");
            }
        }
    }

    Ok(())
}
