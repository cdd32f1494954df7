//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{bail, Result};

pub const USAGE: &str = "\
Usage: wardrobe [--ephemeral] <command> [args]

Commands:
  login [username]               Sign in (password read from WARDROBE_PASSWORD or prompted)
  register <email> <username>    Create an account
  logout                         Sign out and forget the stored session
  whoami                         Show the signed-in user
  chat [--new-outfit] [message]  Ask the outfit assistant; no message starts a session
  wardrobe list                  List clothing items
  wardrobe add <name> <url>      Add a clothing item by image URL
  waitlist list                  List wish-list ideas
  waitlist add <url>             Add an idea by image URL
  waitlist upload <file>         Upload a screenshot as an idea
  extension <output.zip>         Download the browser extension
  help                           Show this message

Options:
  --ephemeral                    Keep the session in memory for this run only";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Register { email: String, username: String },
    Logout,
    WhoAmI,
    Chat { message: Option<String>, new_outfit: bool },
    WardrobeList,
    WardrobeAdd { name: String, image_url: String },
    WaitlistList,
    WaitlistAdd { image_url: String },
    WaitlistUpload { file: PathBuf },
    Extension { output: PathBuf },
    Help,
}

impl Command {
    /// True for commands that need a signed-in session
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Register { .. } | Command::Logout | Command::Help
        )
    }

    /// Notification title shown when the command fails
    pub fn failure_title(&self) -> &'static str {
        match self {
            Command::Login { .. } => "Login failed",
            Command::Register { .. } => "Registration failed",
            Command::Logout => "Logout failed",
            Command::WhoAmI => "Session error",
            Command::Chat { .. } => "Assistant error",
            Command::WardrobeList => "Failed to load wardrobe",
            Command::WardrobeAdd { .. } => "Failed to add item",
            Command::WaitlistList => "Failed to load wish list",
            Command::WaitlistAdd { .. } | Command::WaitlistUpload { .. } => "Failed to add idea",
            Command::Extension { .. } => "Download failed",
            Command::Help => "Error",
        }
    }

    /// Parse arguments without the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Command::Help,
            ["login"] => Command::Login { username: None },
            ["login", username] => Command::Login {
                username: Some(username.to_string()),
            },
            ["register", email, username] => Command::Register {
                email: email.to_string(),
                username: username.to_string(),
            },
            ["logout"] => Command::Logout,
            ["whoami"] => Command::WhoAmI,
            ["chat", rest @ ..] => {
                let new_outfit = rest.contains(&"--new-outfit");
                let words: Vec<&str> = rest.iter().copied().filter(|w| *w != "--new-outfit").collect();
                let message = if words.is_empty() {
                    None
                } else {
                    Some(words.join(" "))
                };
                Command::Chat { message, new_outfit }
            }
            ["wardrobe", "list"] => Command::WardrobeList,
            ["wardrobe", "add", name, image_url] => Command::WardrobeAdd {
                name: name.to_string(),
                image_url: image_url.to_string(),
            },
            ["waitlist", "list"] => Command::WaitlistList,
            ["waitlist", "add", image_url] => Command::WaitlistAdd {
                image_url: image_url.to_string(),
            },
            ["waitlist", "upload", file] => Command::WaitlistUpload {
                file: PathBuf::from(file),
            },
            ["extension", output] => Command::Extension {
                output: PathBuf::from(output),
            },
            other => bail!("Unrecognized command: {}\n\n{}", other.join(" "), USAGE),
        };
        Ok(command)
    }
}
