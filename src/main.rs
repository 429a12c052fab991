//! Interactive console front-end for the chatbot client.
//!
//! Stands in for the browser pages: a login prompt followed by a chat
//! loop with sidebar-style commands for managing conversations and the
//! selected knowledge-base index.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chatbot_client::api::ApiClient;
use chatbot_client::auth::{AuthService, LoginRequest, Route, Session, SignupRequest};
use chatbot_client::chat::{ChatBackend, ChatService, ConversationManager};
use chatbot_client::config::ClientConfig;
use chatbot_client::error::ClientError;
use chatbot_client::storage::{FileTokenStore, TokenStore};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    tracing::info!("Starting chatbot client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Directory holding the token file, overridable for test setups.
fn state_dir() -> PathBuf {
    std::env::var("CHATBOT_STATE_DIR").map_or_else(
        |_| std::env::temp_dir().join("chatbot-client"),
        PathBuf::from,
    )
}

async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(state_dir(), &config.token_key));
    let session = Arc::new(Session::new());
    let api = Arc::new(ApiClient::new(
        &config,
        Arc::clone(&tokens),
        Arc::clone(&session),
    )?);
    let auth = AuthService::new(Arc::clone(&api), Arc::clone(&tokens), Arc::clone(&session));

    auth.initialize();
    if !session.is_authenticated() {
        sign_in(&auth).await?;
    }

    let chat = ChatService::new(api);
    let mut manager = ConversationManager::new();

    match chat.list_indexes().await {
        Ok(indexes) => {
            if let Some(first) = indexes.first() {
                manager.select_index(first.clone());
            }
            println!("Knowledge-base indexes: {}", indexes.join(", "));
        }
        Err(e) if e.is_session_expired() => return Err(e),
        Err(e) => eprintln!("Could not list indexes: {e}"),
    }

    println!("Type a message, or /help for commands.");
    loop {
        let Some(line) = prompt_line("> ")? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &auth, &mut manager) {
                break;
            }
            continue;
        }

        if let Err(e) = manager.submit(&line, &chat).await {
            eprintln!("{e}");
            continue;
        }
        if let Some(reply) = manager.active_conversation().and_then(|c| c.last_message()) {
            println!("{}", reply.content);
        }

        // A 401 during the exchange signed the session out.
        if session.route() == Route::Login {
            println!("Session expired, please sign in again.");
            break;
        }
    }

    Ok(())
}

/// Login prompt, with a signup branch. Loops until a login succeeds.
async fn sign_in(auth: &AuthService) -> Result<(), ClientError> {
    loop {
        println!("Sign in (or type 'signup' as email to register).");
        let Some(email) = prompt_line("email: ")? else {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed").into());
        };

        if email.trim() == "signup" {
            let Some(user_name) = prompt_line("name: ")? else {
                continue;
            };
            let Some(email) = prompt_line("email: ")? else {
                continue;
            };
            let Some(password) = prompt_line("password: ")? else {
                continue;
            };
            match auth
                .signup(&SignupRequest {
                    user_name: user_name.trim().to_string(),
                    email: email.trim().to_string(),
                    password: password.trim().to_string(),
                })
                .await
            {
                Ok(confirmation) => println!("{confirmation}"),
                Err(e) => eprintln!("Registration failed: {e}"),
            }
            continue;
        }

        let Some(password) = prompt_line("password: ")? else {
            continue;
        };
        match auth
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.trim().to_string(),
            })
            .await
        {
            Ok(()) => return Ok(()),
            Err(e) => eprintln!("Login failed: {e}"),
        }
    }
}

/// Handle a slash command. Returns false when the loop should end.
fn handle_command(command: &str, auth: &AuthService, manager: &mut ConversationManager) -> bool {
    let (name, argument) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "help" => {
            println!(
                "/new          start a new conversation\n\
                 /list         list conversations\n\
                 /switch <n>   switch to conversation n\n\
                 /delete <n>   delete conversation n\n\
                 /index <name> select a knowledge-base index\n\
                 /logout       sign out and quit\n\
                 /quit         quit"
            );
        }
        "new" => {
            manager.new_conversation();
            println!("Started a new conversation.");
        }
        "list" => {
            if manager.conversations().is_empty() {
                println!("No conversations yet.");
            }
            for (position, conversation) in manager.conversations().iter().enumerate() {
                let marker = if manager.active_id() == Some(conversation.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {position}: {}", conversation.title);
            }
        }
        "switch" => match conversation_id_at(manager, argument) {
            Some(id) => {
                if manager.select(&id) {
                    println!("Switched.");
                }
            }
            None => eprintln!("No such conversation: {argument}"),
        },
        "delete" => match conversation_id_at(manager, argument) {
            Some(id) => {
                manager.delete(&id);
                println!("Deleted.");
            }
            None => eprintln!("No such conversation: {argument}"),
        },
        "index" => {
            if argument.is_empty() {
                match manager.selected_index() {
                    Some(index) => println!("Selected index: {index}"),
                    None => println!("No index selected."),
                }
            } else {
                manager.select_index(argument.to_string());
                println!("Selected index: {argument}");
            }
        }
        "logout" => {
            auth.logout();
            println!("Signed out.");
            return false;
        }
        "quit" => return false,
        _ => eprintln!("Unknown command: /{name}"),
    }
    true
}

/// Resolve a positional argument from `/list` to a conversation id.
fn conversation_id_at(manager: &ConversationManager, argument: &str) -> Option<String> {
    let position: usize = argument.parse().ok()?;
    manager
        .conversations()
        .get(position)
        .map(|conversation| conversation.id.clone())
}

/// Print a prompt and read one line. `None` means stdin was closed.
fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
