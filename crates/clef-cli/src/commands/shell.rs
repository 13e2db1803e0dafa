//! Interactive session that walks the screen machine.

use std::io::{self, Write};
use std::path::PathBuf;

use clef_core::auth::{AuthClient, RegisterOutcome, SessionResolver};
use clef_core::gallery::{ArtifactKind, ConversionRecord, GalleryClient, Viewer, ViewerState};
use clef_core::media::sanitize_file_name;
use clef_core::nav::{Navigator, Screen};
use clef_core::upload::{UploadClient, UploadOutcome};
use clef_core::{MediaDescriptor, MediaKind};

use crate::camera;
use crate::commands::common::{load_context, write_bytes};
use crate::commands::media;
use crate::error::CliError;
use crate::picker;
use crate::token_store::KeyringTokenStore;

struct ShellSession {
    navigator: Navigator<KeyringTokenStore>,
    viewer: Viewer,
    records: Vec<ConversionRecord>,
    auth: AuthClient,
    uploader: UploadClient,
    gallery: GalleryClient,
}

pub async fn run_shell(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    let auth = AuthClient::new(context.config.clone())?;
    let uploader = UploadClient::new(context.config.clone())?;
    let gallery = GalleryClient::new(context.config.clone())?;

    let mut resolver = SessionResolver::new(auth.clone(), context.store.clone());
    let state = resolver.resolve().await.clone();
    let navigator = Navigator::from_resolved(state, context.store.clone());

    let mut shell = ShellSession {
        navigator,
        viewer: Viewer::new(),
        records: Vec::new(),
        auth,
        uploader,
        gallery,
    };

    println!("clef shell. Type `help` for commands, `quit` to leave.");
    loop {
        let prompt = format!("[{}] > ", shell.navigator.screen().title());
        let Some(line) = read_command(&prompt)? else {
            break;
        };
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();

        match verb {
            "quit" | "exit" => break,
            "help" => shell.print_help(),
            "back" => shell.go_back(),
            _ => {
                // Command failures are printed; only I/O on the prompt
                // itself ends the session.
                if let Err(error) = shell.handle(verb, &args).await {
                    println!("Error: {error}");
                }
            }
        }
    }

    Ok(())
}

fn read_command(prompt: &str) -> Result<Option<String>, CliError> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut buffer = String::new();
    let read = io::stdin().read_line(&mut buffer)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(buffer.trim().to_string()))
}

fn confirm(question: &str) -> Result<bool, CliError> {
    let answer = picker::prompt_line(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes")))
}

/// 1-based list selection; `None` when out of range or not a number.
fn parse_selection(raw: &str, len: usize) -> Option<usize> {
    let number: usize = raw.parse().ok()?;
    if number == 0 || number > len {
        return None;
    }
    Some(number - 1)
}

impl ShellSession {
    async fn handle(&mut self, verb: &str, args: &[&str]) -> Result<(), CliError> {
        match self.navigator.screen() {
            Screen::Login => self.handle_login(verb, args).await,
            Screen::Register => self.handle_register(verb, args).await,
            Screen::Home => self.handle_home(verb).await,
            Screen::Audio => self.handle_audio(verb, args).await,
            Screen::Photo => self.handle_photo(verb, args).await,
            Screen::Conversions => self.handle_conversions(verb, args).await,
        }
    }

    async fn handle_login(&mut self, verb: &str, args: &[&str]) -> Result<(), CliError> {
        match verb {
            "login" => {
                let (email, password) = credentials_from_args(args)?;
                let session = self.auth.sign_in(&email, &password).await?;
                let identity = session.identity.clone();
                self.navigator.login_succeeded(session)?;
                println!("Signed in as {identity}");
                Ok(())
            }
            "register" => {
                self.navigator.go(Screen::Register)?;
                Ok(())
            }
            _ => {
                self.print_help();
                Ok(())
            }
        }
    }

    async fn handle_register(&mut self, verb: &str, args: &[&str]) -> Result<(), CliError> {
        if verb == "register" {
            let (email, password) = credentials_from_args(args)?;
            match self.auth.register(&email, &password).await? {
                RegisterOutcome::SignedIn(session) => {
                    let identity = session.identity.clone();
                    self.navigator.login_succeeded(session)?;
                    println!("Signed in as {identity}");
                }
                RegisterOutcome::Created => {
                    println!("Account created. Use `login` to sign in.");
                    self.navigator.back();
                }
            }
        } else {
            self.print_help();
        }
        Ok(())
    }

    async fn handle_home(&mut self, verb: &str) -> Result<(), CliError> {
        match verb {
            "audio" => {
                self.navigator.go(Screen::Audio)?;
                Ok(())
            }
            "photo" => {
                self.navigator.go(Screen::Photo)?;
                Ok(())
            }
            "sheets" => {
                self.navigator.go(Screen::Conversions)?;
                self.refresh_conversions().await;
                Ok(())
            }
            "logout" => {
                self.navigator.log_out();
                self.viewer.close();
                self.records.clear();
                println!("Signed out.");
                Ok(())
            }
            _ => {
                self.print_help();
                Ok(())
            }
        }
    }

    async fn handle_audio(&mut self, verb: &str, args: &[&str]) -> Result<(), CliError> {
        match verb {
            "record" => {
                let recording = media::capture_recording(None).await?;
                println!("Recorded {} ms of audio", recording.duration_ms);
                if confirm("Submit this recording?")? {
                    self.submit(recording.into_descriptor()).await
                } else {
                    println!("Discarded.");
                    Ok(())
                }
            }
            "file" => {
                let path = args.first().map(PathBuf::from);
                let Some(descriptor) = picker::acquire_file(
                    MediaKind::Audio,
                    path.as_deref(),
                    "Audio file to submit",
                )
                .await?
                else {
                    println!("Cancelled.");
                    return Ok(());
                };
                self.submit(descriptor).await
            }
            _ => {
                self.print_help();
                Ok(())
            }
        }
    }

    async fn handle_photo(&mut self, verb: &str, args: &[&str]) -> Result<(), CliError> {
        match verb {
            "file" => {
                let path = args.first().map(PathBuf::from);
                let Some(descriptor) = picker::acquire_file(
                    MediaKind::Photo,
                    path.as_deref(),
                    "Sheet photo to submit",
                )
                .await?
                else {
                    println!("Cancelled.");
                    return Ok(());
                };
                self.submit(descriptor).await
            }
            "camera" => {
                let descriptor = camera::capture_photo()?;
                self.submit(descriptor).await
            }
            _ => {
                self.print_help();
                Ok(())
            }
        }
    }

    async fn handle_conversions(&mut self, verb: &str, args: &[&str]) -> Result<(), CliError> {
        if let Some(index) = parse_selection(verb, self.records.len()) {
            return self.view_sheet(index).await;
        }
        if verb.parse::<usize>().is_ok() {
            println!("No such entry; `list` shows the current entries.");
            return Ok(());
        }

        match verb {
            "list" => {
                self.refresh_conversions().await;
                Ok(())
            }
            "fetch" => {
                let Some(index) = args
                    .first()
                    .and_then(|raw| parse_selection(raw, self.records.len()))
                else {
                    println!("Pick an entry number from the list, e.g. `fetch 1 mxl`.");
                    return Ok(());
                };
                let kind = match args.get(1) {
                    Some(&"omr") => ArtifactKind::Omr,
                    Some(&"mxl") | None => ArtifactKind::Mxl,
                    Some(other) => {
                        println!("Unknown artifact kind '{other}'; expected omr or mxl.");
                        return Ok(());
                    }
                };
                self.fetch_artifact(index, kind).await
            }
            _ => {
                self.print_help();
                Ok(())
            }
        }
    }

    async fn submit(&mut self, descriptor: MediaDescriptor) -> Result<(), CliError> {
        let label = descriptor.file_name.clone();
        match self
            .uploader
            .submit(descriptor, self.navigator.session())
            .await?
        {
            UploadOutcome::Success { artifact_url } => {
                println!("Uploaded {label}");
                self.navigator.upload_succeeded(artifact_url)?;
                self.refresh_conversions().await;
                Ok(())
            }
            UploadOutcome::Failure { reason } => {
                println!("Conversion failed: {reason}");
                Ok(())
            }
        }
    }

    async fn view_sheet(&mut self, index: usize) -> Result<(), CliError> {
        let file_name = self.records[index].file_name.clone();
        let generation = self.viewer.select(&file_name);
        let result = self
            .gallery
            .sheet_image(self.navigator.session(), &file_name)
            .await;

        if !self.viewer.finish(generation, result) {
            return Ok(());
        }
        match self.viewer.state() {
            ViewerState::Loaded { file_name, bytes } => {
                println!("Viewing {} ({} bytes)", file_name, bytes.len());
            }
            ViewerState::Errored { message, .. } => {
                println!("Could not load the sheet: {message}");
                self.viewer.close();
            }
            _ => {}
        }
        Ok(())
    }

    async fn fetch_artifact(&mut self, index: usize, kind: ArtifactKind) -> Result<(), CliError> {
        let artifact = self.records[index].artifact_name(kind);
        let bytes = self
            .gallery
            .conversion_artifact(self.navigator.session(), &artifact)
            .await?;
        let path = PathBuf::from(sanitize_file_name(&artifact));
        write_bytes(&path, &bytes)
    }

    /// Reload the gallery list. An unreachable gallery downgrades to an
    /// empty list instead of ending the session.
    async fn refresh_conversions(&mut self) {
        match self.gallery.list(self.navigator.session()).await {
            Ok(records) => {
                self.records = records;
                if let Some(artifact) = self.navigator.last_artifact() {
                    println!("Latest artifact: {artifact}");
                }
                self.print_conversions();
            }
            Err(error) => {
                self.records.clear();
                println!("Conversions are unavailable: {error}");
            }
        }
    }

    fn print_conversions(&self) {
        if self.records.is_empty() {
            println!("No conversions yet.");
            return;
        }
        for (index, record) in self.records.iter().enumerate() {
            println!("{:>3}. {}", index + 1, record.file_name);
        }
    }

    fn go_back(&mut self) {
        self.viewer.close();
        if !self.navigator.back() {
            println!("Already at the root screen.");
        }
    }

    fn print_help(&self) {
        match self.navigator.screen() {
            Screen::Login => println!("Commands: login [email [password]], register, quit"),
            Screen::Register => println!("Commands: register [email [password]], back, quit"),
            Screen::Home => println!("Commands: audio, photo, sheets, logout, quit"),
            Screen::Audio => println!("Commands: record, file <path>, back, quit"),
            Screen::Photo => println!("Commands: file <path>, camera, back, quit"),
            Screen::Conversions => {
                println!("Commands: <number>, fetch <number> [omr|mxl], list, back, quit");
            }
        }
    }
}

fn credentials_from_args(args: &[&str]) -> Result<(String, String), CliError> {
    let email = match args.first() {
        Some(email) => (*email).to_string(),
        None => picker::prompt_line("Email")?.unwrap_or_default(),
    };
    let password = match args.get(1) {
        Some(password) => (*password).to_string(),
        None => picker::prompt_line("Password")?.unwrap_or_default(),
    };
    Ok((email, password))
}
