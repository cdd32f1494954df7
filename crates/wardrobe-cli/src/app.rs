//! Command handlers for the wardrobe CLI.
//!
//! `App` owns the configuration, the session store and the API client, and
//! keeps the client's bearer token in step with the session after every
//! transition.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use wardrobe_core::auth::{MemoryStorage, SessionStorage};
use wardrobe_core::chat::Role;
use wardrobe_core::models::{
    ClothingItemCreate, Credentials, Registration, ScreenshotUpload, WaitlistItemCreate,
};
use wardrobe_core::utils::{format_timestamp, truncate};
use wardrobe_core::{ApiClient, ApiError, Config, Conversation, Route, SessionStore};

use crate::commands::Command;

// ============================================================================
// Constants
// ============================================================================

const USERNAME_ENV: &str = "WARDROBE_USERNAME";
const PASSWORD_ENV: &str = "WARDROBE_PASSWORD";

/// Width of image URLs in item listings
const URL_DISPLAY_WIDTH: usize = 60;

/// Typed in an interactive chat to leave it
const QUIT_COMMAND: &str = "/quit";

pub struct App {
    pub config: Config,
    pub session: SessionStore,
    pub api: ApiClient,
}

impl App {
    /// Load config and restore the session. `ephemeral` keeps the session in
    /// memory only, leaving any stored session untouched.
    pub fn new(ephemeral: bool) -> Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });

        let storage: Box<dyn SessionStorage> = if ephemeral {
            Box::new(MemoryStorage::new())
        } else {
            config.session_storage()?
        };
        let mut session = SessionStore::new(storage);
        if let Err(e) = session.restore() {
            warn!(error = %e, "Failed to restore session");
        }

        let mut api = ApiClient::from_config(&config).context("Failed to create API client")?;
        session.authorize(&mut api);

        Ok(Self {
            config,
            session,
            api,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        debug!(?command, state = ?self.session.state(), "Running command");
        if command.requires_session() && !self.session.is_authenticated() {
            show_route(Route::Login);
            bail!("Not signed in");
        }

        match command {
            Command::Login { username } => self.login(username).await,
            Command::Register { email, username } => self.register(email, username).await,
            Command::Logout => self.logout(),
            Command::WhoAmI => self.whoami(),
            Command::Chat {
                message,
                new_outfit,
            } => self.chat(message, new_outfit).await,
            Command::WardrobeList => self.wardrobe_list().await,
            Command::WardrobeAdd { name, image_url } => self.wardrobe_add(name, image_url).await,
            Command::WaitlistList => self.waitlist_list().await,
            Command::WaitlistAdd { image_url } => self.waitlist_add(image_url).await,
            Command::WaitlistUpload { file } => self.waitlist_upload(&file).await,
            Command::Extension { output } => self.download_extension(&output).await,
            Command::Help => {
                println!("{}", crate::commands::USAGE);
                Ok(())
            }
        }
    }

    /// Turn a failure of `command` into the text shown to the user
    pub fn describe_error(&self, command: &Command, err: &anyhow::Error) -> String {
        match err.downcast_ref::<ApiError>() {
            Some(e) if e.is_unauthorized() && command.requires_session() => {
                "Your session has expired. Sign in again with `wardrobe login`.".to_string()
            }
            Some(ApiError::NetworkError(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            Some(ApiError::NetworkError(e)) if e.is_connect() => format!(
                "Unable to connect to {}. Is the server running?",
                self.api.base_url()
            ),
            _ => format!("{:#}", err),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username
            .or_else(|| std::env::var(USERNAME_ENV).ok())
            .or_else(|| self.config.last_username.clone())
        {
            Some(username) => username,
            None => prompt_line("Username or email: ")?,
        };
        let password = read_password()?;

        let route = self
            .session
            .login(&self.api, &Credentials::new(username.clone(), password))
            .await;
        // Success or failure, the client must match the session
        self.session.authorize(&mut self.api);
        let route = route?;

        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Welcome!");
        show_route(route);
        Ok(())
    }

    async fn register(&mut self, email: String, username: String) -> Result<()> {
        let password = read_password()?;
        let registration = Registration {
            email,
            username,
            password,
        };

        let (user, route) = self.session.register(&self.api, &registration).await?;
        println!("Account {} created. Sign in to continue.", user.username);
        show_route(route);
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        let route = self.session.logout()?;
        self.session.authorize(&mut self.api);
        println!("Signed out.");
        show_route(route);
        Ok(())
    }

    fn whoami(&self) -> Result<()> {
        let Some(user) = self.session.user() else {
            bail!("Not signed in");
        };
        println!("[{}] {}", user.initials(), user.username);
        println!("Email:   {}", user.email);
        println!("Since:   {}", format_timestamp(&user.created_at));
        Ok(())
    }

    // =========================================================================
    // Assistant
    // =========================================================================

    async fn chat(&mut self, message: Option<String>, new_outfit: bool) -> Result<()> {
        let mut conversation = Conversation::new();

        if let Some(message) = message {
            let sent = conversation
                .send(&self.api, &message)
                .await
                .map(|reply| reply.map(|m| m.content.clone()));
            return match sent {
                Ok(Some(reply)) => {
                    println!("{}", reply);
                    Ok(())
                }
                Ok(None) => bail!("Message is empty"),
                Err(e) => {
                    print_last_reply(&conversation);
                    Err(e.into())
                }
            };
        }

        let mut prefill = if new_outfit {
            Conversation::preset_prompt("new_outfit")
        } else {
            None
        };
        println!("Ask the outfit assistant. Type {} to leave.", QUIT_COMMAND);

        loop {
            let prompt = match prefill {
                Some(text) => format!("you [Enter sends \"{}\"]> ", text),
                None => "you> ".to_string(),
            };
            let line = match read_line(&prompt)? {
                Some(line) => line,
                None => break,
            };
            if line.trim() == QUIT_COMMAND {
                break;
            }

            let input = match (line.trim().is_empty(), prefill.take()) {
                (true, Some(text)) => text.to_string(),
                _ => line,
            };
            if !conversation.can_submit(&input) {
                continue;
            }

            let sent = conversation.send(&self.api, &input).await.map(|_| ());
            match sent {
                Ok(()) => print_last_reply(&conversation),
                Err(e) => {
                    print_last_reply(&conversation);
                    let command = Command::Chat {
                        message: None,
                        new_outfit: false,
                    };
                    eprintln!(
                        "{}: {}",
                        command.failure_title(),
                        self.describe_error(&command, &e.into())
                    );
                }
            }
        }

        info!(messages = conversation.messages().len(), "Chat finished");
        Ok(())
    }

    // =========================================================================
    // Wardrobe
    // =========================================================================

    async fn wardrobe_list(&self) -> Result<()> {
        let items = self.api.wardrobe_items().await?;
        if items.is_empty() {
            println!("Your wardrobe is empty. Add an item with `wardrobe wardrobe add <name> <url>`.");
            return Ok(());
        }

        for item in &items {
            println!(
                "#{:<5} {:<24} {}",
                item.id,
                truncate(&item.name, 24),
                truncate(&item.image_url, URL_DISPLAY_WIDTH)
            );
            if let Some(features) = item.features.as_ref().filter(|f| !f.is_empty()) {
                println!("       {}", serde_json::to_string(features)?);
            }
        }
        Ok(())
    }

    async fn wardrobe_add(&self, name: String, image_url: String) -> Result<()> {
        let item = ClothingItemCreate::new(name, image_url);
        item.validate()?;

        let created = self.api.create_wardrobe_item(&item).await?;
        println!("Added \"{}\" (#{})", created.name, created.id);
        Ok(())
    }

    // =========================================================================
    // Waitlist
    // =========================================================================

    async fn waitlist_list(&self) -> Result<()> {
        let items = self.api.waitlist_items().await?;
        if items.is_empty() {
            println!("Your wish list is empty. Add an idea with `wardrobe waitlist add <url>`.");
            return Ok(());
        }

        for item in &items {
            println!(
                "#{:<5} [{}] {}  {}",
                item.id,
                item.status.as_deref().unwrap_or("new"),
                truncate(&item.image_url, URL_DISPLAY_WIDTH),
                format_timestamp(&item.created_at)
            );
        }
        Ok(())
    }

    async fn waitlist_add(&self, image_url: String) -> Result<()> {
        let item = WaitlistItemCreate::new(image_url);
        item.validate()?;

        let created = self.api.add_waitlist_item(&item).await?;
        println!("Idea #{} added to your wish list", created.id);
        Ok(())
    }

    async fn waitlist_upload(&self, file: &Path) -> Result<()> {
        let upload = ScreenshotUpload::from_file(file)?;
        let created = self.api.upload_waitlist_screenshot(&upload).await?;
        println!("Screenshot uploaded as idea #{}", created.id);
        Ok(())
    }

    async fn download_extension(&self, output: &Path) -> Result<()> {
        let archive = self.api.download_extension().await?;
        std::fs::write(output, &archive)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Saved extension ({} bytes) to {}", archive.len(), output.display());
        Ok(())
    }
}

// ============================================================================
// Terminal helpers
// ============================================================================

fn show_route(route: Route) {
    debug!(route = route.path(), "Next screen");
    match route {
        Route::Dashboard => {
            println!();
            println!("  chat [--new-outfit]   Ask the outfit assistant");
            println!("  wardrobe list         Browse your clothes");
            println!("  waitlist list         Browse your wish list");
            println!("  extension <file>      Get the browser extension");
        }
        Route::Login => println!("Sign in with `wardrobe login`."),
    }
}

fn print_last_reply(conversation: &Conversation) {
    if let Some(message) = conversation.messages().last() {
        if message.role == Role::Assistant {
            println!("assistant> {}", message.content);
        }
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(password)
}

fn prompt_line(prompt: &str) -> Result<String> {
    match read_line(prompt)? {
        Some(line) if !line.trim().is_empty() => Ok(line.trim().to_string()),
        _ => bail!("Input is required"),
    }
}

/// Read one line from stdin; `None` at end of input
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
