//! Console runner: one local patient talking to the dialogue engine over
//! stdin/stdout.
//!
//! Commands: `/register <age> <male|female|other> [height_cm] [weight_kg]`,
//! `/start`, `/cancel`, `/voice`, `/photo`, `/quit`; a number picks a
//! choice of the last prompt; anything else is sent as text.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use symptom_intake::adapters::{
    FileSessionStore, InMemoryConsultationRecorder, InMemoryProfileProvider, InMemorySessionStore,
    OpenAIProvider,
};
use symptom_intake::application::advisory::AdvisoryGateway;
use symptom_intake::application::dialogue::{DialogueEngine, Reply};
use symptom_intake::config::{AppConfig, StorageBackend};
use symptom_intake::domain::consultation::{
    ChoiceToken, Gender, MediaKind, PatientProfile, Prompt, UserEvent,
};
use symptom_intake::domain::foundation::{UserId, ValidationError};
use symptom_intake::ports::SessionStore;
use symptom_intake::telemetry;

const CONSOLE_USER: &str = "console";
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

enum Command {
    Event(UserEvent),
    Register(Vec<String>),
    Quit,
    Unknown(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init_tracing(&config.logging)?;

    let provider = OpenAIProvider::new(config.ai.provider_config()?)?;
    let gateway = AdvisoryGateway::new(
        Arc::new(provider),
        config.consultation.normalizer(),
        config.specialists.to_roster()?,
        config.ai.advisory_settings(),
    );

    let sessions: Arc<dyn SessionStore> = match (&config.storage.backend, &config.storage.directory)
    {
        (StorageBackend::File, Some(directory)) => Arc::new(FileSessionStore::new(directory)),
        _ => Arc::new(InMemorySessionStore::new()),
    };
    let profiles = InMemoryProfileProvider::new();
    let engine = Arc::new(DialogueEngine::new(
        gateway,
        sessions,
        Arc::new(profiles.clone()),
        Arc::new(InMemoryConsultationRecorder::new()),
        config.consultation.engine_settings(),
    ));
    info!(
        workflow = ?config.consultation.workflow,
        storage = ?config.storage.backend,
        "Symptom intake console started"
    );

    let janitor = {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = engine.sweep_idle_sessions().await {
                    warn!(error = %e, "Idle session sweep failed");
                }
            }
        })
    };

    let user = UserId::new(CONSOLE_USER)?;
    println!("Register first: /register <age> <male|female|other> [height_cm] [weight_kg]");
    let mut last_prompt = engine.current_prompt(&user).await?;
    render(&last_prompt);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match parse(&line, &last_prompt) {
            Command::Event(event) => event,
            Command::Register(args) => {
                match registration(&args) {
                    Ok(profile) => {
                        profiles.insert(user.clone(), profile).await;
                        println!("Registered. Type /start to begin.");
                    }
                    Err(e) => println!("Registration failed: {}", e),
                }
                continue;
            }
            Command::Quit => break,
            Command::Unknown(input) => {
                println!("Unknown command: {}", input);
                continue;
            }
        };

        match engine.handle(&user, event).await {
            Ok(reply) => {
                if let Some(prompt) = show(&reply) {
                    last_prompt = prompt;
                }
            }
            Err(e) => {
                error!(error = %e, "Turn failed");
                println!("Something went wrong, please try again.");
            }
        }
    }

    janitor.abort();
    Ok(())
}

fn parse(line: &str, last_prompt: &Prompt) -> Command {
    let line = line.trim();
    let mut words = line.split_whitespace();
    match words.next() {
        Some("/start") => Command::Event(UserEvent::choice(ChoiceToken::StartConsultation)),
        Some("/cancel") => Command::Event(UserEvent::choice(ChoiceToken::Cancel)),
        Some("/voice") => Command::Event(UserEvent::MediaInput(MediaKind::Voice)),
        Some("/photo") => Command::Event(UserEvent::MediaInput(MediaKind::Photo)),
        Some("/register") => Command::Register(words.map(str::to_string).collect()),
        Some("/quit") => Command::Quit,
        Some(cmd) if cmd.starts_with('/') => Command::Unknown(cmd.to_string()),
        _ => match line.parse::<usize>() {
            Ok(n) if n >= 1 && n <= last_prompt.choices.len() => {
                Command::Event(UserEvent::choice(last_prompt.choices[n - 1].token))
            }
            _ => Command::Event(UserEvent::text(line)),
        },
    }
}

fn registration(args: &[String]) -> Result<PatientProfile, ValidationError> {
    let number = |index: usize, field: &str| -> Result<Option<f32>, ValidationError> {
        args.get(index)
            .map(|v| {
                v.parse::<f32>()
                    .map_err(|_| ValidationError::invalid_format(field, "not a number"))
            })
            .transpose()
    };

    let age = number(0, "age")?.ok_or_else(|| ValidationError::empty_field("age"))?;
    let gender = match args.get(1).map(|g| g.to_lowercase()).as_deref() {
        Some("male") => Gender::Male,
        Some("female") => Gender::Female,
        Some("other") => Gender::Other,
        _ => {
            return Err(ValidationError::invalid_format(
                "gender",
                "expected male, female or other",
            ))
        }
    };

    let mut profile = PatientProfile::new()
        .with_age(age as u32)?
        .with_gender(gender);
    if let Some(height) = number(2, "height_cm")? {
        profile = profile.with_height_cm(height as u32)?;
    }
    if let Some(weight) = number(3, "weight_kg")? {
        profile = profile.with_weight_kg(weight)?;
    }
    Ok(profile)
}

/// Prints a reply; returns the prompt whose numbered choices are now live.
fn show(reply: &Reply) -> Option<Prompt> {
    match reply {
        Reply::Rejected { rejection, prompt } => {
            println!("{}", rejection);
            render(prompt);
        }
        Reply::Superseded => return None,
        other => {
            if let Some(prompt) = other.prompt() {
                render(prompt);
            }
        }
    }
    reply.prompt().cloned()
}

fn render(prompt: &Prompt) {
    println!("\n{}", prompt.text);
    for (i, choice) in prompt.choices.iter().enumerate() {
        println!("  {}. {}", i + 1, choice.label);
    }
}
